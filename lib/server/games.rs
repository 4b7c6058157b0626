//! Provider read fan-out and the TFT save/update/delete batches.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};

use super::error::ApiError;
use super::{batch_response, check_batch_size};
use crate::ingest::{ParticipantFilter, SaveItem};
use crate::riot_client::{MatchListQuery, RiotClient, RiotClientError, Title};
use crate::state::{AppState, SharedIngest};

type Pairs = Query<Vec<(String, String)>>;

/// Every value given for `key`, in order. Repeated keys are how batch reads are expressed.
fn values(pairs: &[(String, String)], key: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
        .collect()
}

/// Last value given for `key`, parsed.
fn single<T: FromStr>(pairs: &[(String, String)], key: &str) -> Result<Option<T>, ApiError> {
    pairs
        .iter()
        .rev()
        .find(|(name, _)| name == key)
        .map(|(_, raw)| {
            raw.parse::<T>()
                .map_err(|_| ApiError::BadRequest(format!("invalid value for {key}: {raw}")))
        })
        .transpose()
}

fn provider(state: &AppState, title: Title) -> Result<&RiotClient, ApiError> {
    state
        .provider(title)
        .ok_or_else(|| ApiError::Unavailable(format!("{title} provider is not configured")))
}

fn ingest(state: &AppState) -> Result<&SharedIngest, ApiError> {
    state
        .ingest
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("tft provider is not configured".to_string()))
}

/// Read routes shared by every title.
pub(super) fn title_routes(title: Title) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/game/matches",
            get(move |State(state): State<Arc<AppState>>, Query(pairs): Pairs| async move {
                get_matches(&state, title, &pairs).await
            }),
        )
        .route(
            "/game/match-list",
            get(move |State(state): State<Arc<AppState>>, Query(pairs): Pairs| async move {
                get_match_list(&state, title, &pairs).await
            }),
        )
        .route(
            "/summoner/by-puuid",
            get(move |State(state): State<Arc<AppState>>, Query(pairs): Pairs| async move {
                get_summoners_by_puuid(&state, title, &pairs).await
            }),
        )
        .route(
            "/summoner/by-name",
            get(move |State(state): State<Arc<AppState>>, Query(pairs): Pairs| async move {
                get_summoners_by_name(&state, title, &pairs).await
            }),
        )
}

/// Write routes backed by the ingestion pipeline. TFT only.
pub(super) fn save_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/game/matches/save",
        post(save_matches)
            .put(update_matches)
            .delete(delete_matches),
    )
}

async fn get_matches(
    state: &AppState,
    title: Title,
    pairs: &[(String, String)],
) -> Result<Response, ApiError> {
    let ids = values(pairs, "match_id");
    check_batch_size(state, ids.len())?;
    let client = provider(state, title)?;
    Ok(batch_response(client.get_matches(&ids).await))
}

async fn get_match_list(
    state: &AppState,
    title: Title,
    pairs: &[(String, String)],
) -> Result<Response, ApiError> {
    let puuids = values(pairs, "puuid");
    check_batch_size(state, puuids.len())?;
    let defaults = MatchListQuery::default();
    let query = MatchListQuery {
        start: single(pairs, "start")?.unwrap_or(defaults.start),
        count: single(pairs, "count")?.unwrap_or(defaults.count),
        start_time: single(pairs, "start_time")?,
        end_time: single(pairs, "end_time")?,
    };
    let client = provider(state, title)?;
    Ok(batch_response(client.get_match_lists(&puuids, &query).await))
}

async fn get_summoners_by_puuid(
    state: &AppState,
    title: Title,
    pairs: &[(String, String)],
) -> Result<Response, ApiError> {
    let puuids = values(pairs, "puuid");
    check_batch_size(state, puuids.len())?;
    let client = provider(state, title)?;
    Ok(batch_response(client.get_summoners_by_puuid(&puuids).await))
}

async fn get_summoners_by_name(
    state: &AppState,
    title: Title,
    pairs: &[(String, String)],
) -> Result<Response, ApiError> {
    let names = values(pairs, "name");
    check_batch_size(state, names.len())?;
    let client = provider(state, title)?;
    match client.get_summoners_by_name(&names).await {
        Ok(batch) => Ok(batch_response(batch)),
        Err(err @ RiotClientError::Unsupported { .. }) => Err(ApiError::NotFound(err.to_string())),
        Err(err) => Err(ApiError::BadRequest(err.to_string())),
    }
}

async fn save_matches(
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<SaveItem>>,
) -> Result<Response, ApiError> {
    check_batch_size(&state, items.len())?;
    let service = ingest(&state)?;
    Ok(batch_response(
        service
            .save_batch(&items, &ParticipantFilter::disabled())
            .await,
    ))
}

async fn update_matches(
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<SaveItem>>,
) -> Result<Response, ApiError> {
    check_batch_size(&state, items.len())?;
    let service = ingest(&state)?;
    Ok(batch_response(service.update_batch(&items).await))
}

async fn delete_matches(
    State(state): State<Arc<AppState>>,
    Json(ids): Json<Vec<String>>,
) -> Result<Response, ApiError> {
    check_batch_size(&state, ids.len())?;
    let service = ingest(&state)?;
    Ok(batch_response(service.delete_batch(&ids).await))
}
