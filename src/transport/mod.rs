//! The HTTP/WebSocket transport surface, assembled the way
//! `oidc-discovery-server` assembles its router: an `Arc<AppState>` shared
//! across handlers, bound via `tokio::net::TcpListener`, served with
//! `axum::serve(..).with_graceful_shutdown(..)`.

mod query;
mod ws;

use crate::relay::Relay;
use crate::retention::RetentionStore;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub struct AppState {
    pub relay: Arc<Relay>,
    pub store: Option<Arc<dyn RetentionStore>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new().route("/ws", get(ws::handler));
    if state.store.is_some() {
        router = router.route("/messages/24-hour-cache", post(query::handler));
    }
    router
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    addr: SocketAddr,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "transport surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
