use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::{Catalog, CatalogError, CatalogGame, CatalogPage, CatalogQuery, CatalogTerm};

const API_BASE: &str = "https://api.rawg.io/api";
const ADDITIONS_PAGE_SIZE: u32 = 50;
const TAGS_PAGE_SIZE: u32 = 100;

/// The RAWG video game database
pub struct RawgCatalog {
    client: Client,
    key: String,
    base: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Game {
    id: i64,
    name: String,
    released: Option<String>,
    background_image: Option<String>,
    rating: Option<f64>,
    metacritic: Option<i64>,
    platforms: Option<Vec<PlatformEntry>>,
    genres: Option<Vec<Named>>,
    esrb_rating: Option<Named>,
    description_raw: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PlatformEntry {
    platform: Named,
}

#[derive(Debug, Clone, Deserialize)]
struct Named {
    name: String,
    slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Term {
    id: i64,
    name: String,
    slug: String,
    games_count: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct List<T> {
    count: u64,
    next: Option<String>,
    results: Vec<T>,
}

impl RawgCatalog {
    pub fn new(key: impl Into<String>, timeout: Duration) -> Result<Self, CatalogError> {
        Self::with_base(key, API_BASE, timeout)
    }

    pub fn with_base(
        key: impl Into<String>,
        base: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::FetchError(e.to_string()))?;

        Ok(Self {
            client,
            key: key.into(),
            base: base.into(),
        })
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, CatalogError> {
        let params = std::iter::once(("key", self.key.clone())).chain(params.iter().cloned());

        Url::parse_with_params(&format!("{}{}", self.base, path), params)
            .map_err(|e| CatalogError::FetchError(e.to_string()))
    }

    fn search_url(&self, query: &CatalogQuery, today: NaiveDate) -> Result<Url, CatalogError> {
        let mut params = vec![
            ("page", query.page.max(1).to_string()),
            ("page_size", query.fetch_size().to_string()),
            ("exclude_additions", "true".to_string()),
            ("exclude_parents", "true".to_string()),
        ];

        if let Some(search) = query.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
        }

        if !query.platforms.is_empty() {
            let ids: Vec<_> = query
                .platforms
                .iter()
                .map(|c| c.catalog_platform_id().to_string())
                .collect();

            params.push(("platforms", ids.join(",")));
        }

        if let [genre] = query.genres.as_slice() {
            params.push(("genres", genre.clone()));
        }

        if !query.tags.is_empty() {
            params.push(("tags", query.tags.join(",")));
        }

        if let Some(window) = query.release_window(today) {
            params.push(("dates", window.as_param()));
        }

        if let Some(ordering) = query.ordering {
            params.push(("ordering", ordering.as_param().to_string()));
        }

        self.url("/games", &params)
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T, CatalogError> {
        self.get(url)
            .await?
            .json()
            .await
            .map_err(|e| CatalogError::ParseError(e.to_string()))
    }

    async fn get(&self, url: Url) -> Result<Response, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::FetchError(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(CatalogError::NotFound),
            status if !status.is_success() => Err(CatalogError::FetchError(format!(
                "catalog answered with {}",
                status
            ))),
            _ => Ok(response),
        }
    }
}

#[async_trait]
impl Catalog for RawgCatalog {
    async fn game(&self, id: i64) -> Result<CatalogGame, CatalogError> {
        let game: Game = self.fetch(self.url(&format!("/games/{}", id), &[])?).await?;

        Ok(game.into())
    }

    async fn search(&self, query: &CatalogQuery) -> Result<CatalogPage, CatalogError> {
        let today = Utc::now().date_naive();
        let list: List<Game> = self.fetch(self.search_url(query, today)?).await?;

        Ok(CatalogPage::select(list, query))
    }

    async fn additions(&self, id: i64) -> Result<Vec<CatalogGame>, CatalogError> {
        let url = self.url(
            &format!("/games/{}/additions", id),
            &[("page_size", ADDITIONS_PAGE_SIZE.to_string())],
        )?;

        match self.fetch::<List<Game>>(url).await {
            Ok(list) => Ok(list.results.into_iter().map(CatalogGame::from).collect()),
            Err(CatalogError::NotFound) => Ok(vec![]),
            Err(e) => Err(e),
        }
    }

    async fn genres(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
        let list: List<Term> = self.fetch(self.url("/genres", &[])?).await?;

        Ok(list.results.into_iter().map(CatalogTerm::from).collect())
    }

    async fn tags(&self) -> Result<Vec<CatalogTerm>, CatalogError> {
        let url = self.url("/tags", &[("page_size", TAGS_PAGE_SIZE.to_string())])?;
        let list: List<Term> = self.fetch(url).await?;

        Ok(list.results.into_iter().map(CatalogTerm::from).collect())
    }
}

impl From<Game> for CatalogGame {
    fn from(game: Game) -> Self {
        let genres = game.genres.unwrap_or_default();

        Self {
            id: game.id,
            name: game.name,
            released: game.released,
            background_image: game.background_image,
            rating: game.rating,
            metacritic: game.metacritic,
            platforms: game
                .platforms
                .unwrap_or_default()
                .into_iter()
                .map(|p| p.platform.name)
                .collect(),
            genre_slugs: genres.iter().filter_map(|g| g.slug.clone()).collect(),
            genres: genres.into_iter().map(|g| g.name).collect(),
            esrb_rating: game.esrb_rating.and_then(|r| r.slug),
            description: game.description_raw,
        }
    }
}

impl From<Term> for CatalogTerm {
    fn from(term: Term) -> Self {
        Self {
            id: term.id,
            name: term.name,
            slug: term.slug,
            games_count: term.games_count.unwrap_or_default(),
        }
    }
}

impl CatalogPage {
    /// Keeps the games the query asks for, up to one page
    fn select(list: List<Game>, query: &CatalogQuery) -> Self {
        let page_size = query.page_size.clamp(1, CatalogQuery::MAX_PAGE_SIZE) as usize;

        Self {
            count: list.count,
            has_next: list.next.is_some(),
            games: list
                .results
                .into_iter()
                .map(CatalogGame::from)
                .filter(|g| query.keeps(g))
                .take(page_size)
                .collect(),
        }
    }
}
