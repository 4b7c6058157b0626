pub mod error;
mod games;
pub mod monitoring;
mod stats;
mod tags;


use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use prometheus_client::encoding::text::encode;
use serde::Serialize;
use tracing::{error, info};

use crate::auth::{Access, Scope, API_KEY_HEADER};
use crate::envelope::{BatchResponse, Envelope};
use crate::riot_client::Title;
use crate::state::AppState;
use error::ApiError;

// Health endpoint handler
async fn health_handler() -> String {
    "Healthy".to_string()
}

async fn expose_metrics(State(state): State<Arc<AppState>>) -> Result<String, StatusCode> {
    let mut buffer = String::new();
    let registry = state.registry.read().await;
    encode(&mut buffer, &registry).map_err(|err| {
        error!(event = "metrics_encode_failed", error = %err, "failed to encode metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(buffer)
}

fn status_code(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY)
}

/// Array of envelopes under the batch's aggregate status. An empty batch answers 404.
pub(crate) fn batch_response<T: Serialize>(batch: BatchResponse<T>) -> Response {
    (status_code(batch.status_or(404)), Json(batch.items)).into_response()
}

pub(crate) fn envelope_response<T: Serialize>((status, envelope): (u16, Envelope<T>)) -> Response {
    (status_code(status), Json(envelope)).into_response()
}

pub(crate) fn check_batch_size(state: &AppState, len: usize) -> Result<(), ApiError> {
    if len > state.max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "batch of {len} items exceeds the limit of {}",
            state.max_batch_size
        )));
    }
    Ok(())
}

/// GET and HEAD need read scope. Every other method needs write scope.
async fn require_scope(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let required = match *request.method() {
        Method::GET | Method::HEAD => Scope::Read,
        _ => Scope::Write,
    };
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    match state.auth.check(api_key, required) {
        Access::Allow => Ok(next.run(request).await),
        Access::Deny => Err(ApiError::Forbidden),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .nest(
            "/tft",
            games::title_routes(Title::Tft)
                .merge(games::save_routes())
                .merge(stats::routes()),
        )
        .nest("/lol", games::title_routes(Title::Lol))
        .nest("/valorant", games::title_routes(Title::Valorant))
        .nest("/internal", tags::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_scope));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(expose_metrics))
        .merge(protected)
        .with_state(state)
}

/// Starts the HTTP server on the supplied socket address. It stops accepting connections
/// once the state's shutdown token is cancelled.
pub async fn setup_server_with_addr(
    state: Arc<AppState>,
    addr: SocketAddr,
) -> Result<tokio::task::JoinHandle<()>, std::io::Error> {
    let shutdown_token = state.shutdown_token.clone();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(event = "server_listening", addr = %listener.local_addr()?, "http server listening");
    let server_handle = tokio::spawn(async move {
        let served = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_token.cancelled().await;
        })
        .await;
        if let Err(err) = served {
            error!(event = "server_failed", error = %err, "http server stopped with an error");
        }
    });

    Ok(server_handle)
}
