use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json,
};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::CatalogSearchQuery,
    serialized::{CatalogGame, CatalogPage, CatalogTerm, ToSerialized},
    Router,
};

/// Searches the catalog on the enabled consoles only
#[utoipa::path(
    get,
    path = "/v1/catalog/games",
    tag = "catalog",
    params(CatalogSearchQuery),
    responses(
        (status = 200, body = CatalogPage, description = "Add-ons and season passes are left out"),
        (status = 400, description = "Unknown ordering or malformed date range"),
        (status = 503, description = "No catalog key is configured, or the catalog is unreachable")
    )
)]
pub async fn search_games(
    State(context): State<ServerContext>,
    Query(query): Query<CatalogSearchQuery>,
) -> ServerResult<Json<CatalogPage>> {
    let catalog = context.tracker.catalog()?;

    let mut query = query.to_query()?;
    query.restrict_platforms(&context.tracker.consoles.enabled().await);

    let page = catalog.search(&query).await?;

    Ok(Json(page.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/catalog/games/{id}",
    tag = "catalog",
    params(("id" = i64, Path, description = "Catalog game id")),
    responses(
        (status = 200, body = CatalogGame),
        (status = 404, description = "The catalog doesn't know the game"),
        (status = 503, description = "No catalog key is configured, or the catalog is unreachable")
    )
)]
pub async fn game(
    State(context): State<ServerContext>,
    Path(id): Path<i64>,
) -> ServerResult<Json<CatalogGame>> {
    let game = context.tracker.catalog()?.game(id).await?;

    Ok(Json(game.to_serialized()))
}

/// DLCs, season passes and expansions of a game, for display only
#[utoipa::path(
    get,
    path = "/v1/catalog/games/{id}/additions",
    tag = "catalog",
    params(("id" = i64, Path, description = "Catalog game id")),
    responses(
        (status = 200, body = Vec<CatalogGame>, description = "Empty when the game is unknown"),
        (status = 503, description = "No catalog key is configured, or the catalog is unreachable")
    )
)]
pub async fn additions(
    State(context): State<ServerContext>,
    Path(id): Path<i64>,
) -> ServerResult<Json<Vec<CatalogGame>>> {
    let additions = context.tracker.catalog()?.additions(id).await?;

    Ok(Json(additions.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/catalog/genres",
    tag = "catalog",
    responses(
        (status = 200, body = Vec<CatalogTerm>),
        (status = 503, description = "No catalog key is configured, or the catalog is unreachable")
    )
)]
pub async fn genres(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<CatalogTerm>>> {
    let genres = context.tracker.catalog()?.genres().await?;

    Ok(Json(genres.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/catalog/tags",
    tag = "catalog",
    responses(
        (status = 200, body = Vec<CatalogTerm>),
        (status = 503, description = "No catalog key is configured, or the catalog is unreachable")
    )
)]
pub async fn tags(
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<CatalogTerm>>> {
    let tags = context.tracker.catalog()?.tags().await?;

    Ok(Json(tags.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/games", get(search_games))
        .route("/games/:id", get(game))
        .route("/games/:id/additions", get(additions))
        .route("/genres", get(genres))
        .route("/tags", get(tags))
}
