//! HTTP boundary for the recommendation service.
//!
//! Exposes `POST /recommend` plus liveness endpoints. Every per-query error
//! becomes a JSON body `{"error": {"code", "message"}}` with a status that
//! distinguishes caller mistakes from engine faults.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::RecommendError;
use crate::recommend::{Recommendation, RecommendService};

#[derive(Clone)]
struct AppState {
    service: RecommendService,
    default_results: usize,
}

/// Body of `POST /recommend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub text: String,
    #[serde(default)]
    pub max_results: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub records: usize,
    pub dimension: usize,
    pub metric: String,
    pub model: String,
    pub version: String,
}

/// Error wrapper that renders as a structured JSON response.
pub struct ApiError(RecommendError);

impl From<RecommendError> for ApiError {
    fn from(error: RecommendError) -> Self {
        Self(error)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            RecommendError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            RecommendError::VectorizationFailure { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RecommendError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(code = self.0.status_code(), error = %self.0, "recommendation failed");
        }
        let body = serde_json::json!({
            "error": {
                "code": self.0.status_code(),
                "message": self.0.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// Build the router over a loaded service.
pub fn router(service: RecommendService, default_results: usize, server: &ServerConfig) -> Router {
    let state = AppState {
        service,
        default_results,
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .layer(ServiceBuilder::new().layer(cors_layer(&server.cors_origins)))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "API is running" }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine = state.service.engine();
    Json(HealthResponse {
        status: "ok".to_string(),
        records: engine.len(),
        dimension: engine.index().dimension().get(),
        metric: engine.metric().to_string(),
        model: engine.generator().model_name().to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<Recommendation>, ApiError> {
    let Json(request) = payload.map_err(|rejection| RecommendError::InvalidArgument {
        reason: rejection.body_text(),
    })?;

    let k = match request.max_results {
        None => state.default_results,
        Some(n) if n > 0 => n as usize,
        Some(n) => {
            return Err(RecommendError::InvalidArgument {
                reason: format!("max_results must be a positive integer, got {n}"),
            }
            .into());
        }
    };

    let timeout = state.service.timeout();
    let recommendation = state
        .service
        .recommend_with_timeout(request.text, k, timeout)
        .await?;
    Ok(Json(recommendation))
}

/// Bind and serve until Ctrl+C.
pub async fn serve(
    service: RecommendService,
    default_results: usize,
    server: &ServerConfig,
    bind: &str,
) -> std::io::Result<()> {
    let app = router(service, default_results, server);
    let listener = tokio::net::TcpListener::bind(bind).await?;

    info!(address = %listener.local_addr()?, "recommendation API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
