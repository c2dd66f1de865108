use axum::{extract::State, routing::get, Json};
use gamehub_tracker::REJECTION_REASONS;

use crate::{
    context::ServerContext,
    serialized::{EnabledConsoles, ToSerialized},
    Router,
};

/// Falls back to the default consoles when nothing usable is stored
#[utoipa::path(
    get,
    path = "/v1/config/enabled-consoles",
    tag = "config",
    responses(
        (status = 200, body = EnabledConsoles)
    )
)]
pub async fn enabled_consoles(State(context): State<ServerContext>) -> Json<EnabledConsoles> {
    let consoles = context.tracker.consoles.enabled().await;

    Json(consoles.to_serialized())
}

#[utoipa::path(
    get,
    path = "/v1/config/rejection-reasons",
    tag = "config",
    responses(
        (status = 200, body = Vec<String>, description = "Suggested reasons, any other text is accepted too")
    )
)]
pub async fn rejection_reasons() -> Json<Vec<String>> {
    Json(REJECTION_REASONS.iter().map(|r| r.to_string()).collect())
}

pub fn router() -> Router {
    Router::new()
        .route("/enabled-consoles", get(enabled_consoles))
        .route("/rejection-reasons", get(rejection_reasons))
}
