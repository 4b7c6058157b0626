//! Aggregates over stored participants and matches.
//!
//! "No matching rows" is reported as [`StatOutcome::NothingFound`], never as a zero.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::riot_client::region::Region;
pub use crate::store::PlayerDamage;
use crate::store::{
    DamageRank, LengthAggregate, MatchStore, ParticipantStat, SampleFilter, StatAggregate,
    StoreError,
};
use crate::tags::{lookup_tags, MatchTags, TagIds, TagMiss, TagResolution};

pub const NOTHING_FOUND_MESSAGE: &str = "No data found";

#[derive(Debug, Clone, PartialEq)]
pub enum StatOutcome<T> {
    Found(T),
    NothingFound,
    TagNotFound(TagMiss),
}

impl<T> StatOutcome<T> {
    fn from_option(value: Option<T>) -> Self {
        value.map_or(Self::NothingFound, Self::Found)
    }

    /// HTTP status and envelope for a single-item stat response.
    pub fn into_envelope(self) -> (u16, Envelope<T>) {
        match self {
            Self::Found(value) => (200, Envelope::data(value)),
            Self::NothingFound => (404, Envelope::error(404, NOTHING_FOUND_MESSAGE)),
            Self::TagNotFound(miss) => (TagMiss::STATUS, miss.envelope()),
        }
    }
}

/// Query string shared by the stat endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatQuery {
    pub region: Option<Region>,
    pub event: Option<String>,
    pub tournament: Option<String>,
    pub stage: Option<String>,
}

impl StatQuery {
    fn tags(&self) -> MatchTags {
        MatchTags {
            event: self.event.clone(),
            tournament: self.tournament.clone(),
            stage: self.stage.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub min: i32,
    pub avg: f64,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kill {
    pub min: i32,
    pub avg: f64,
    pub max: i32,
    pub sum: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathRound {
    pub min: i32,
    pub avg: f64,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamesDamage {
    pub min: PlayerDamage,
    pub avg: f64,
    pub max: PlayerDamage,
    pub sum: i64,
}

/// A duration split into whole days, hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeElapsed {
    pub second: u64,
    pub minute: u64,
    pub hour: u64,
    pub day: u64,
}

impl TimeElapsed {
    pub fn from_seconds(seconds: f64) -> Self {
        let total = if seconds.is_finite() && seconds > 0.0 {
            seconds.floor() as u64
        } else {
            0
        };
        Self {
            second: total % 60,
            minute: total / 60 % 60,
            hour: total / 3_600 % 24,
            day: total / 86_400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamesTime {
    pub min_time: TimeElapsed,
    pub avg_time: TimeElapsed,
    pub max_time: TimeElapsed,
    pub sum_time: TimeElapsed,
}

impl From<StatAggregate> for Placement {
    fn from(aggregate: StatAggregate) -> Self {
        Self {
            min: aggregate.min,
            avg: aggregate.avg,
            max: aggregate.max,
        }
    }
}

impl From<StatAggregate> for Kill {
    fn from(aggregate: StatAggregate) -> Self {
        Self {
            min: aggregate.min,
            avg: aggregate.avg,
            max: aggregate.max,
            sum: aggregate.sum,
        }
    }
}

impl From<StatAggregate> for DeathRound {
    fn from(aggregate: StatAggregate) -> Self {
        Self {
            min: aggregate.min,
            avg: aggregate.avg,
            max: aggregate.max,
        }
    }
}

impl From<LengthAggregate> for GamesTime {
    fn from(aggregate: LengthAggregate) -> Self {
        Self {
            min_time: TimeElapsed::from_seconds(aggregate.min),
            avg_time: TimeElapsed::from_seconds(aggregate.avg),
            max_time: TimeElapsed::from_seconds(aggregate.max),
            sum_time: TimeElapsed::from_seconds(aggregate.sum),
        }
    }
}

async fn resolve_filter<S>(store: &S, tags: &MatchTags) -> Result<Result<TagIds, TagMiss>, StoreError>
where
    S: MatchStore + ?Sized,
{
    let resolution = lookup_tags(
        store,
        tags.event.as_deref(),
        tags.tournament.as_deref(),
        tags.stage.as_deref(),
    )
    .await?;
    Ok(match resolution {
        TagResolution::Resolved(resolved) => Ok(resolved.ids()),
        TagResolution::NotFound(miss) => Err(miss),
    })
}

async fn player_stat<S, T>(
    store: &S,
    puuid: &str,
    query: &StatQuery,
    stat: ParticipantStat,
) -> Result<StatOutcome<T>, StoreError>
where
    S: MatchStore + ?Sized,
    T: From<StatAggregate>,
{
    let tags = match resolve_filter(store, &query.tags()).await? {
        Ok(tags) => tags,
        Err(miss) => return Ok(StatOutcome::TagNotFound(miss)),
    };
    let filter = SampleFilter {
        puuid: Some(puuid.to_string()),
        region: query.region,
        tags,
    };
    let aggregate = store.aggregate_participants(&filter, stat).await?;
    Ok(StatOutcome::from_option(aggregate.map(T::from)))
}

pub async fn player_placement<S>(
    store: &S,
    puuid: &str,
    query: &StatQuery,
) -> Result<StatOutcome<Placement>, StoreError>
where
    S: MatchStore + ?Sized,
{
    player_stat(store, puuid, query, ParticipantStat::Placement).await
}

pub async fn player_kills<S>(
    store: &S,
    puuid: &str,
    query: &StatQuery,
) -> Result<StatOutcome<Kill>, StoreError>
where
    S: MatchStore + ?Sized,
{
    player_stat(store, puuid, query, ParticipantStat::PlayersEliminated).await
}

pub async fn player_death_round<S>(
    store: &S,
    puuid: &str,
    query: &StatQuery,
) -> Result<StatOutcome<DeathRound>, StoreError>
where
    S: MatchStore + ?Sized,
{
    player_stat(store, puuid, query, ParticipantStat::LastRound).await
}

/// Damage across every stored participant. The lowest and highest dealers are read as rows,
/// the rest is aggregated by the store.
pub async fn games_damage<S>(store: &S, query: &StatQuery) -> Result<StatOutcome<GamesDamage>, StoreError>
where
    S: MatchStore + ?Sized,
{
    let tags = match resolve_filter(store, &query.tags()).await? {
        Ok(tags) => tags,
        Err(miss) => return Ok(StatOutcome::TagNotFound(miss)),
    };
    let filter = SampleFilter {
        region: query.region,
        tags,
        ..SampleFilter::default()
    };
    let Some(aggregate) = store
        .aggregate_participants(&filter, ParticipantStat::DamageToPlayers)
        .await?
    else {
        return Ok(StatOutcome::NothingFound);
    };
    let (lowest, highest) = futures::try_join!(
        store.damage_extreme(&filter, DamageRank::Lowest),
        store.damage_extreme(&filter, DamageRank::Highest),
    )?;
    let damage = lowest.zip(highest).map(|(min, max)| GamesDamage {
        min,
        avg: aggregate.avg,
        max,
        sum: aggregate.sum,
    });
    Ok(StatOutcome::from_option(damage))
}

pub async fn games_time<S>(store: &S, query: &StatQuery) -> Result<StatOutcome<GamesTime>, StoreError>
where
    S: MatchStore + ?Sized,
{
    let tags = match resolve_filter(store, &query.tags()).await? {
        Ok(tags) => tags,
        Err(miss) => return Ok(StatOutcome::TagNotFound(miss)),
    };
    let aggregate = store.aggregate_match_lengths(&tags).await?;
    Ok(StatOutcome::from_option(aggregate.map(GamesTime::from)))
}

pub async fn game_damage_ranking<S>(
    store: &S,
    match_id: &str,
) -> Result<StatOutcome<Vec<PlayerDamage>>, StoreError>
where
    S: MatchStore + ?Sized,
{
    let ranking = store.game_damage(match_id).await?;
    Ok(StatOutcome::from_option((!ranking.is_empty()).then_some(ranking)))
}
