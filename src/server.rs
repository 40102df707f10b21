//! HTTP adapter around the scoring service

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::scoring::{ScoreError, ScoringService};

/// Shared state handed to every handler
pub type AppState = Arc<ScoringService>;

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ScoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            ScoreError::InvalidJson(_)
            | ScoreError::InvalidRequest(_)
            | ScoreError::PredictionFailed(_) => StatusCode::BAD_REQUEST,
            ScoreError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ScoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ScoreError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
            details: self.details(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/predict", post(predict_handler))
        .with_state(state)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn predict_handler(State(service): State<AppState>, body: Bytes) -> Response {
    // Model load and tree traversal are CPU/disk bound
    let result = tokio::task::spawn_blocking(move || service.score_bytes(&body))
        .await
        .unwrap_or_else(|e| Err(ScoreError::Internal(e.to_string())));

    match result {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            warn!(code = err.code(), details = ?err.details(), "Prediction request failed");
            err.into_response()
        }
    }
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        addr = %listener.local_addr()?,
        threshold = state.policy().threshold(),
        "Scoring server listening"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Scoring server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::pipeline::ArtifactStore;
    use crate::scoring::DecisionPolicy;

    fn unloaded_state(dir: &TempDir) -> AppState {
        Arc::new(ScoringService::from_store(
            ArtifactStore::new(dir.path()),
            DecisionPolicy::default(),
        ))
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::post("/api/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_ok_without_model() {
        let dir = TempDir::new().unwrap();
        let app = build_router(unloaded_state(&dir));

        let req = Request::get("/health").body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_invalid_json_is_400() {
        let dir = TempDir::new().unwrap();
        let app = build_router(unloaded_state(&dir));

        let resp = app.oneshot(predict_request("{not json")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["code"], "invalid_json");
    }

    #[tokio::test]
    async fn test_empty_object_is_400_before_model_load() {
        let dir = TempDir::new().unwrap();
        let app = build_router(unloaded_state(&dir));

        let resp = app.oneshot(predict_request("{}")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert_eq!(body["code"], "invalid_request");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_missing_model_is_503() {
        let dir = TempDir::new().unwrap();
        let app = build_router(unloaded_state(&dir));

        let resp = app
            .oneshot(predict_request(r#"{"income": 1000}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(resp).await;
        assert_eq!(body["code"], "model_unavailable");
        assert!(body["details"].as_str().unwrap().contains("riskgate train"));
    }
}
