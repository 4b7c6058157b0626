use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use super::envelope_response;
use super::error::ApiError;
use crate::state::AppState;
use crate::stats::{self, StatQuery};

pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stat/player/:puuid/placement", get(player_placement))
        .route("/stat/player/:puuid/kill", get(player_kill))
        .route("/stat/player/:puuid/death-round", get(player_death_round))
        .route("/stat/games/damage", get(games_damage))
        .route("/stat/games/time", get(games_time))
        .route("/stat/game/:match_id/damage", get(game_damage))
}

async fn player_placement(
    State(state): State<Arc<AppState>>,
    Path(puuid): Path<String>,
    Query(query): Query<StatQuery>,
) -> Result<Response, ApiError> {
    let outcome = stats::player_placement(&*state.store, &puuid, &query).await?;
    Ok(envelope_response(outcome.into_envelope()))
}

async fn player_kill(
    State(state): State<Arc<AppState>>,
    Path(puuid): Path<String>,
    Query(query): Query<StatQuery>,
) -> Result<Response, ApiError> {
    let outcome = stats::player_kills(&*state.store, &puuid, &query).await?;
    Ok(envelope_response(outcome.into_envelope()))
}

async fn player_death_round(
    State(state): State<Arc<AppState>>,
    Path(puuid): Path<String>,
    Query(query): Query<StatQuery>,
) -> Result<Response, ApiError> {
    let outcome = stats::player_death_round(&*state.store, &puuid, &query).await?;
    Ok(envelope_response(outcome.into_envelope()))
}

async fn games_damage(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatQuery>,
) -> Result<Response, ApiError> {
    let outcome = stats::games_damage(&*state.store, &query).await?;
    Ok(envelope_response(outcome.into_envelope()))
}

async fn games_time(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatQuery>,
) -> Result<Response, ApiError> {
    let outcome = stats::games_time(&*state.store, &query).await?;
    Ok(envelope_response(outcome.into_envelope()))
}

async fn game_damage(
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<String>,
) -> Result<Response, ApiError> {
    let outcome = stats::game_damage_ranking(&*state.store, &match_id).await?;
    Ok(envelope_response(outcome.into_envelope()))
}
