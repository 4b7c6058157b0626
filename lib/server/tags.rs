//! Administration of events, tournaments and stages under `/internal`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::error::ApiError;
use crate::state::AppState;
use crate::store::StoreOutcome;
use crate::tags::{TagKind, TagTree};

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:kind", get(list_tags).post(create_tag))
        .route(
            "/:kind/:name",
            get(get_tag).put(replace_children).delete(delete_tag),
        )
}

fn parse_kind(raw: &str) -> Result<TagKind, ApiError> {
    raw.parse().map_err(ApiError::NotFound)
}

fn not_found(kind: TagKind, name: &str) -> ApiError {
    ApiError::NotFound(format!("{} {name} not found", kind.label()))
}

/// Children can be created alongside any tag, so every kind's gauge is re-read.
async fn refresh_tag_gauges(state: &AppState) {
    for kind in TagKind::ALL {
        match state.store.count_tags(kind).await {
            Ok(count) => state.metrics.ingest.set_tag_count(kind, count),
            Err(err) => warn!(
                event = "tag_gauge_refresh_failed",
                kind = kind.as_str(),
                error = %err,
                "could not refresh tag gauge"
            ),
        }
    }
}

async fn list_tags(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let nodes = state.store.list_tag_trees(kind).await?;
    Ok(Json(nodes.iter().map(|node| node.to_json(kind)).collect()))
}

async fn create_tag(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let tree = TagTree::from_json(kind, &body).map_err(ApiError::Unprocessable)?;

    match state.store.create_tag_tree(kind, &tree).await? {
        StoreOutcome::Ok(node) => {
            refresh_tag_gauges(&state).await;
            info!(event = "tag_created", kind = kind.as_str(), name = %node.name, "created tag");
            Ok((StatusCode::CREATED, Json(node.to_json(kind))).into_response())
        }
        StoreOutcome::Conflict => Err(ApiError::Conflict(format!(
            "{} {} already exists",
            kind.label(),
            tree.name
        ))),
        StoreOutcome::NotFound => Err(not_found(kind, &tree.name)),
    }
}

async fn get_tag(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.store.get_tag_tree(kind, &name).await? {
        StoreOutcome::Ok(node) => Ok(Json(node.to_json(kind))),
        StoreOutcome::NotFound | StoreOutcome::Conflict => Err(not_found(kind, &name)),
    }
}

async fn replace_children(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    let children = TagTree::children_from_json(kind, &body)
        .map_err(ApiError::Unprocessable)?
        .unwrap_or_default();

    match state.store.replace_tag_children(kind, &name, &children).await? {
        StoreOutcome::Ok(node) => {
            refresh_tag_gauges(&state).await;
            Ok(Json(node.to_json(kind)))
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict => Err(not_found(kind, &name)),
    }
}

async fn delete_tag(
    State(state): State<Arc<AppState>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.store.delete_tag(kind, &name).await? {
        StoreOutcome::Ok(()) => {
            state.metrics.ingest.tag_deleted(kind);
            info!(event = "tag_deleted", kind = kind.as_str(), name = %name, "deleted tag");
            Ok(Json(json!({"message": format!("Deleted {} {name}", kind.label())})))
        }
        StoreOutcome::NotFound | StoreOutcome::Conflict => Err(not_found(kind, &name)),
    }
}
