use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use gamehub_tracker::{
    CatalogOrdering, CatalogQuery, Console, DateRange, RequestFilter, RequestStatus, Submission,
    UnknownVariant,
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ServerError, ServerResult};

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewRequestSchema {
    #[validate(length(max = 128))]
    pub requester: Option<String>,
    #[validate(length(max = 256))]
    pub game_title: Option<String>,
    #[validate(url, length(max = 2048))]
    pub game_image: Option<String>,
    #[validate(range(min = 1))]
    pub catalog_id: Option<i64>,
    /// One of PS5, Nintendo Switch, PS4, Xbox One, Xbox Series X, PC
    #[validate(length(min = 1, max = 32))]
    pub console: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginSchema {
    #[validate(length(max = 256))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnabledConsolesSchema {
    /// Console names, unknown names are dropped
    #[validate(length(max = 16))]
    #[schema(value_type = Vec<String>)]
    pub consoles: Vec<Value>,
}

/// The moderation fields of a request, every field is optional
#[allow(dead_code)]
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationSchema {
    pub status: Option<RequestStatusSchema>,
    /// Only kept while the request is rejected, null clears it
    pub rejection_reason: Option<String>,
    /// Only kept while the request is approved
    pub available: Option<bool>,
    /// Corrects the upvote counter
    pub upvotes: Option<u32>,
}

#[allow(dead_code)]
#[derive(Debug, ToSchema, Deserialize)]
pub enum RequestStatusSchema {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListRequestsQuery {
    /// Pending, Approved or Rejected
    pub status: Option<String>,
    pub console: Option<String>,
    pub catalog_id: Option<i64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CatalogSearchQuery {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Comma separated catalog platform ids
    pub platforms: Option<String>,
    /// Comma separated genre slugs, games matching any of them are returned
    pub genres: Option<String>,
    /// Comma separated tag ids or slugs
    pub tags: Option<String>,
    /// One of -released, -rating, -added, -metacritic, name
    pub ordering: Option<String>,
    /// Release window as YYYY-MM-DD,YYYY-MM-DD
    pub dates: Option<String>,
    /// Only games released by today
    pub released_only: Option<bool>,
    /// Leave out games rated mature or adults only
    pub hide_mature: Option<bool>,
}

impl NewRequestSchema {
    pub fn into_submission(self) -> ServerResult<Submission> {
        Ok(Submission {
            requester: self.requester,
            game_title: self.game_title,
            game_image: self.game_image,
            catalog_id: self.catalog_id,
            console: parse_console(&self.console)?,
        })
    }
}

impl ListRequestsQuery {
    pub fn to_filter(&self) -> ServerResult<RequestFilter> {
        let status = self
            .status
            .as_deref()
            .map(|s| s.parse::<RequestStatus>())
            .transpose()
            .map_err(|e| ServerError::InvalidInput(e.to_string()))?;

        let console = self.console.as_deref().map(parse_console).transpose()?;

        Ok(RequestFilter {
            status,
            console,
            catalog_id: self.catalog_id,
        })
    }
}

impl CatalogSearchQuery {
    pub fn to_query(&self) -> ServerResult<CatalogQuery> {
        let ordering = self
            .ordering
            .as_deref()
            .map(|o| {
                CatalogOrdering::from_param(o)
                    .ok_or_else(|| ServerError::InvalidInput(format!("Unknown ordering: {}", o)))
            })
            .transpose()?;

        // Unknown platform ids are ignored, the enabled consoles decide the rest
        let platforms = split_list(self.platforms.as_deref())
            .filter_map(|id| id.parse().ok())
            .filter_map(Console::from_catalog_platform_id)
            .collect();

        let dates = self
            .dates
            .as_deref()
            .map(|d| {
                DateRange::from_param(d)
                    .ok_or_else(|| ServerError::InvalidInput(format!("Invalid date range: {}", d)))
            })
            .transpose()?;

        let defaults = CatalogQuery::default();

        Ok(CatalogQuery {
            search: self.search.clone(),
            page: self.page.unwrap_or(defaults.page),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            platforms,
            genres: split_list(self.genres.as_deref())
                .map(|g| g.to_string())
                .collect(),
            tags: split_list(self.tags.as_deref())
                .map(|t| t.to_string())
                .collect(),
            ordering,
            dates,
            released_only: self.released_only.unwrap_or_default(),
            hide_mature: self.hide_mature.unwrap_or_default(),
        })
    }
}

fn parse_console(value: &str) -> ServerResult<Console> {
    value
        .trim()
        .parse()
        .map_err(|e: UnknownVariant| ServerError::InvalidInput(e.to_string()))
}

fn split_list(value: Option<&str>) -> impl Iterator<Item = &str> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ServerError::InvalidInput(e.body_text()))?;

        extracted_json
            .0
            .validate()
            .map_err(|e| ServerError::InvalidInput(format!("Request body is invalid: {}", e)))?;

        Ok(Self(extracted_json.0))
    }
}
