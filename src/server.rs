use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;

use crate::{api, store::Database};

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/{segment}/read", get(api::read))
        .route("/{segment}/count", get(api::count))
        .route("/{segment}/create", post(api::create))
        .route("/{segment}/update", put(api::update))
        .route("/{segment}/delete", put(api::delete))
        .route("/{segment}/softDelete", put(api::soft_delete))
        .route("/{segment}/restore", put(api::restore))
        .with_state(db)
}

/// Binds the reference remote store on `addr`.
pub async fn bind(addr: &str) -> std::io::Result<TcpListener> {
    TcpListener::bind(addr).await
}

/// Serves the remote store API over `db` until the listener fails.
pub async fn start_api_server(listener: TcpListener, db: Database) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "remote store listening");
    }
    axum::serve(listener, router(db)).await
}
