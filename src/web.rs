use crate::app::{AppContext, AppError, AppStats};
use crate::semantic::RecommendationResult;
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

#[derive(Clone)]
struct SharedState {
    app: Arc<AppContext>,
}

/// Build the router. Exposed to the crate so tests can drive it in-process.
pub(crate) fn router(app: Arc<AppContext>) -> Router {
    let shared_state = Arc::new(SharedState { app });

    Router::new()
        .route("/recommend", post(recommend))
        .route("/health", get(health))
        .layer(cors_layer())
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(shared_state)
}

/// Any origin, method and header, with credentials.
///
/// `*` is not allowed alongside credentials, so the request's own values
/// are echoed back instead.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                log::error!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::warn!("shutting down");
}

async fn start_app(app: Arc<AppContext>) -> anyhow::Result<()> {
    let addr = app.config().socket_addr()?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    log::info!("listening on {addr}");

    axum::serve(listener, router(app))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

pub fn start_daemon(app: AppContext) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(async { start_app(Arc::new(app)).await })
}

#[derive(Debug)]
enum HttpError {
    /// Request body failed to parse; rejected before reaching the recommender
    Rejected(JsonRejection),
    App(AppError),
}

// Tell axum how to convert `HttpError` into a response.
impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        match self {
            HttpError::Rejected(rejection) => {
                log::debug!("rejected request: {}", rejection.body_text());
                (
                    rejection.status(),
                    Json(json!({"error": rejection.body_text()})),
                )
            }
            HttpError::App(err @ AppError::Timeout(_)) => {
                log::error!("{err:?}");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    Json(json!({"error": err.to_string()})),
                )
            }
            HttpError::App(err) => {
                log::error!("{err:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": err.to_string()})),
                )
            }
        }
        .into_response()
    }
}

// This enables using `?` on anything that converts into `AppError`.
impl<E> From<E> for HttpError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self::App(err.into())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecommendRequest {
    pub query: String,
}

async fn recommend(
    State(state): State<Arc<SharedState>>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<RecommendationResult>, HttpError> {
    let Json(payload) = payload.map_err(HttpError::Rejected)?;

    log::debug!("payload: {payload:?}");

    let app = state.app.clone();
    let timeout = app.config().request_timeout();

    // inference is CPU bound, keep it off the async workers
    let task = tokio::task::spawn_blocking(move || app.recommend(&payload.query));

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => Ok(Json(result?)),
        Ok(Err(join_err)) => Err(anyhow::Error::new(join_err)
            .context("recommendation task failed")
            .into()),
        Err(_) => Err(AppError::Timeout(timeout).into()),
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub stats: AppStats,
}

async fn health(State(state): State<Arc<SharedState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        stats: state.app.stats(),
    })
}
