//! Read-only HTTP endpoint reporting the applied schema version.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use tracing::{error, info};

use crate::engine::{EngineError, MigrationEngine};

/// Every path is served by the same handler; only the method is checked.
pub fn router(engine: Arc<dyn MigrationEngine>) -> Router {
    Router::new().fallback(status).with_state(engine)
}

/// Serve the status endpoint on `0.0.0.0:<port>` until the listener fails.
pub async fn serve(port: u16, engine: Arc<dyn MigrationEngine>) -> std::io::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "Serving migration status");
    axum::serve(listener, router(engine)).await
}

async fn status(method: Method, State(engine): State<Arc<dyn MigrationEngine>>) -> Response {
    if method != Method::GET {
        return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
    }

    match engine.current_version().await {
        Ok(version) => Json(version).into_response(),
        Err(EngineError::NilVersion) => {
            info!("No migration to be performed");
            (StatusCode::EXPECTATION_FAILED, "No migration to be performed").into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to get version");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
