use axum::{response::IntoResponse, Json};
use gamehub_tracker::ADMIN_COOKIE;
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{admin, auth, catalog, config, requests, schemas, serialized};

#[derive(OpenApi)]
#[openapi(
    paths(
        requests::list_requests,
        requests::create_request,
        requests::request,
        requests::upvote_status,
        requests::cast_upvote,
        requests::remove_upvote,
        auth::login,
        auth::logout,
        auth::session,
        admin::update_request,
        admin::delete_request,
        admin::analytics,
        admin::set_enabled_consoles,
        config::enabled_consoles,
        config::rejection_reasons,
        catalog::search_games,
        catalog::game,
        catalog::additions,
        catalog::genres,
        catalog::tags,
    ),
    components(schemas(
        schemas::NewRequestSchema,
        schemas::LoginSchema,
        schemas::EnabledConsolesSchema,
        schemas::ModerationSchema,
        schemas::RequestStatusSchema,
        serialized::GameRequest,
        serialized::VoteResult,
        serialized::VoteStatus,
        serialized::AdminStatus,
        serialized::EnabledConsoles,
        serialized::CatalogGame,
        serialized::CatalogPage,
        serialized::CatalogTerm,
        serialized::Analytics,
        serialized::StatusCount,
        serialized::ConsoleCount,
        serialized::DayCount,
        serialized::TopGame,
    )),
    modifiers(&Security),
    info(
        title = "gamehub API",
        description = "gamehub-server exposes endpoints to request games, upvote them and moderate requests"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Cookie(ApiKeyValue::new(ADMIN_COOKIE));

            components.add_security_scheme("AdminSession", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
