//! HTTP surface for the AI orchestration gateway.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use splitboard_core::ai::{AnalyzeRequest, Gateway, GatewayError};

#[derive(Clone)]
pub struct ServerState {
    pub gateway: Arc<Gateway>,
}

/// Error body: `{error, details?}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

pub fn build_router(gateway: Arc<Gateway>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .layer(CorsLayer::permissive())
        .with_state(ServerState { gateway })
}

/// Start serving `POST /api/analyze`.
pub async fn run_server(bind_addr: &str, gateway: Arc<Gateway>) -> Result<()> {
    let app = build_router(gateway);
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(%bind_addr, "analyze endpoint listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Handler for POST /api/analyze
async fn analyze(
    State(state): State<ServerState>,
    Json(request): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    match state.gateway.run_task(&request).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => {
            let status =
                StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let details = match &err {
                GatewayError::Upstream { details, .. } => details.clone(),
                _ => None,
            };
            tracing::warn!(status = status.as_u16(), error = %err, "analyze request failed");
            (
                status,
                Json(ErrorBody {
                    error: err.to_string(),
                    details,
                }),
            )
                .into_response()
        }
    }
}
