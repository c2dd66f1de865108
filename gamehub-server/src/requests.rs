use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json,
};
use uuid::Uuid;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{ListRequestsQuery, NewRequestSchema, ValidatedJson},
    serialized::{GameRequest, ToSerialized, VoteResult, VoteStatus},
    voter::Voter,
    Router,
};

#[utoipa::path(
    get,
    path = "/v1/requests",
    tag = "requests",
    params(ListRequestsQuery),
    responses(
        (status = 200, body = Vec<GameRequest>, description = "Requests, most upvoted first")
    )
)]
pub async fn list_requests(
    State(context): State<ServerContext>,
    Query(query): Query<ListRequestsQuery>,
) -> ServerResult<Json<Vec<GameRequest>>> {
    let requests = context.tracker.requests.list(&query.to_filter()?).await?;

    Ok(Json(requests.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/requests",
    tag = "requests",
    request_body = NewRequestSchema,
    responses(
        (status = 201, body = GameRequest),
        (status = 409, description = "The game is already requested for this console")
    )
)]
pub async fn create_request(
    State(context): State<ServerContext>,
    ValidatedJson(body): ValidatedJson<NewRequestSchema>,
) -> ServerResult<(StatusCode, Json<GameRequest>)> {
    let request = context
        .tracker
        .requests
        .submit(body.into_submission()?)
        .await?;

    Ok((StatusCode::CREATED, Json(request.to_serialized())))
}

#[utoipa::path(
    get,
    path = "/v1/requests/{id}",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, body = GameRequest),
        (status = 404, description = "No such request")
    )
)]
pub async fn request(
    State(context): State<ServerContext>,
    Path(id): Path<Uuid>,
) -> ServerResult<Json<GameRequest>> {
    let request = context.tracker.requests.request(id).await?;

    Ok(Json(request.to_serialized()))
}

/// Answers from the vote table, and corrects the client's voted cache to match
#[utoipa::path(
    get,
    path = "/v1/requests/{id}/upvote",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, body = VoteStatus)
    )
)]
pub async fn upvote_status(
    State(context): State<ServerContext>,
    mut voter: Voter,
    Path(id): Path<Uuid>,
) -> ServerResult<(HeaderMap, Json<VoteStatus>)> {
    let has_voted = context
        .tracker
        .ledger
        .has_voted(id, &voter.identity.id)
        .await?;

    voter.record(id, has_voted);

    Ok((voter.cookie_headers()?, Json(VoteStatus { has_voted })))
}

#[utoipa::path(
    post,
    path = "/v1/requests/{id}/upvote",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, body = VoteResult, description = "Voting twice reports alreadyVoted with the current count"),
        (status = 404, description = "No such request"),
        (status = 503, description = "The vote could not be recorded in time, nothing was changed")
    )
)]
pub async fn cast_upvote(
    State(context): State<ServerContext>,
    mut voter: Voter,
    Path(id): Path<Uuid>,
) -> ServerResult<(HeaderMap, Json<VoteResult>)> {
    let outcome = context
        .tracker
        .ledger
        .cast_upvote(id, &voter.identity.id)
        .await?;

    voter.record(id, true);

    Ok((voter.cookie_headers()?, Json(outcome.to_serialized())))
}

#[utoipa::path(
    delete,
    path = "/v1/requests/{id}/upvote",
    tag = "requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, body = VoteResult, description = "success is false when there was no vote to remove"),
        (status = 404, description = "No such request")
    )
)]
pub async fn remove_upvote(
    State(context): State<ServerContext>,
    mut voter: Voter,
    Path(id): Path<Uuid>,
) -> ServerResult<(HeaderMap, Json<VoteResult>)> {
    let outcome = context
        .tracker
        .ledger
        .remove_upvote(id, &voter.identity.id)
        .await?;

    voter.record(id, false);

    Ok((voter.cookie_headers()?, Json(outcome.to_serialized())))
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id", get(request))
        .route(
            "/:id/upvote",
            get(upvote_status).post(cast_upvote).delete(remove_upvote),
        )
}
