use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
};

use axum::routing::get;
use log::info;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod admin;
mod auth;
mod catalog;
mod config;
mod context;
mod cookies;
mod docs;
mod errors;
mod requests;
mod schemas;
mod serialized;
mod voter;

pub use context::ServerContext;
pub use docs::ApiDoc;
pub use errors::{ServerError, ServerResult};

pub type Router = axum::Router<ServerContext>;

/// Builds the gamehub HTTP application
pub fn app(context: ServerContext) -> axum::Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/requests", requests::router())
        .nest("/admin", auth::router().merge(admin::router()))
        .nest("/config", config::router())
        .nest("/catalog", catalog::router());

    Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context)
}

/// Starts the gamehub server
pub async fn run_server(context: ServerContext, port: u16) -> io::Result<()> {
    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();
    let listener = TcpListener::bind(&addr).await?;

    info!("Listening on port {}", port);

    axum::serve(listener, app(context).into_make_service()).await
}
