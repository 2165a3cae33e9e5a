//! The read-only HTTP status surface: a liveness root, a placeholder pool
//! manager listing, and the `app_state` snapshot the ops dashboard polls.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::EngineError;
use crate::state::ChainState;

#[derive(Serialize)]
struct AppStateResponse {
    #[serde(flatten)]
    snapshot: crate::state::AppStateSnapshot,
    failed_transactions: usize,
    pending_transactions: usize,
    finalized_transactions: usize,
}

async fn root() -> Json<Value> {
    Json(json!({ "Hello": "World" }))
}

async fn pool_managers() -> Json<Value> {
    Json(json!({ "pool_managers": [] }))
}

async fn app_state(State(state): State<Arc<ChainState>>) -> Json<AppStateResponse> {
    Json(AppStateResponse {
        snapshot: state.snapshot(),
        failed_transactions: state.failed_transactions().len(),
        pending_transactions: state.pending().len(),
        finalized_transactions: state.finalized().len(),
    })
}

fn router(state: Arc<ChainState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/pool-managers/", get(pool_managers))
        .route("/app/", get(app_state))
        .with_state(state)
}

/// Serve the status routes at `addr` until `cancel` fires.
pub async fn serve(addr: SocketAddr, state: Arc<ChainState>, cancel: CancellationToken) -> Result<(), EngineError> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(EngineError::Http)?;
    info!(%addr, "http status surface listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(EngineError::Http)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_core::{ChainName, NodeFamily};
    use tower::ServiceExt;

    #[tokio::test]
    async fn root_reports_hello_world() {
        let (state, _rx) = ChainState::new(ChainName::Ethereum, NodeFamily::Alchemy, 1);
        let response = router(state)
            .oneshot(axum::http::Request::builder().uri("/").body(axum::body::Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }
}
