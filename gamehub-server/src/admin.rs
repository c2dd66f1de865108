use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json,
};
use gamehub_tracker::ModerationPatch;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    auth::Admin,
    context::ServerContext,
    errors::ServerResult,
    schemas::{EnabledConsolesSchema, ValidatedJson},
    serialized::{Analytics, EnabledConsoles, GameRequest, ToSerialized},
    Router,
};

/// Changes status, rejection reason, availability or the upvote counter.
/// Unknown keys are ignored, but at least one known key must be present.
#[utoipa::path(
    patch,
    path = "/v1/admin/requests/{id}",
    tag = "admin",
    request_body = crate::schemas::ModerationSchema,
    params(("id" = Uuid, Path, description = "Request id")),
    security(("AdminSession" = [])),
    responses(
        (status = 200, body = GameRequest),
        (status = 400, description = "No valid updates, or a field has the wrong type"),
        (status = 401, description = "Not logged in as admin"),
        (status = 404, description = "No such request")
    )
)]
pub async fn update_request(
    Admin(session): Admin,
    State(context): State<ServerContext>,
    Path(id): Path<Uuid>,
    Json(body): Json<Value>,
) -> ServerResult<Json<GameRequest>> {
    let patch = ModerationPatch::from_json(&body)?;

    let request = context
        .tracker
        .moderation
        .update_request(&session, id, patch)
        .await?;

    Ok(Json(request.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/v1/admin/requests/{id}",
    tag = "admin",
    params(("id" = Uuid, Path, description = "Request id")),
    security(("AdminSession" = [])),
    responses(
        (status = 204, description = "The request and its votes are gone"),
        (status = 401, description = "Not logged in as admin"),
        (status = 404, description = "No such request")
    )
)]
pub async fn delete_request(
    Admin(session): Admin,
    State(context): State<ServerContext>,
    Path(id): Path<Uuid>,
) -> ServerResult<StatusCode> {
    context
        .tracker
        .moderation
        .delete_request(&session, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/v1/admin/analytics",
    tag = "admin",
    security(("AdminSession" = [])),
    responses(
        (status = 200, body = Analytics),
        (status = 401, description = "Not logged in as admin")
    )
)]
pub async fn analytics(
    Admin(session): Admin,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Analytics>> {
    let analytics = context.tracker.requests.analytics(&session).await?;

    Ok(Json(analytics.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/admin/config/enabled-consoles",
    tag = "admin",
    request_body = EnabledConsolesSchema,
    security(("AdminSession" = [])),
    responses(
        (status = 200, body = EnabledConsoles, description = "The consoles that were stored, unknown names dropped"),
        (status = 401, description = "Not logged in as admin")
    )
)]
pub async fn set_enabled_consoles(
    Admin(session): Admin,
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<EnabledConsolesSchema>,
) -> ServerResult<Json<EnabledConsoles>> {
    let consoles = context
        .tracker
        .consoles
        .set_enabled(&session, &Value::Array(body.consoles))
        .await?;

    Ok(Json(consoles.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/requests/:id", patch(update_request).delete(delete_request))
        .route("/analytics", get(analytics))
        .route("/config/enabled-consoles", post(set_enabled_consoles))
}
