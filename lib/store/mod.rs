//! Relational store seam.
//!
//! `PgStore` backs the running service. Test builds add `MemoryStore`, the same contract over
//! in-process tables, so ingestion, tag and stat behavior can be tested without Postgres.

#[cfg(test)]
pub mod memory;
pub mod pg;

use std::sync::Arc;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::pooled_connection::deadpool::PoolError;
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;

use crate::ingest::graph::MatchGraph;
use crate::ingest::writer::WriteOutcome;
use crate::riot_client::region::Region;
use crate::tags::{MatchTags, ResolvedTags, TagIds, TagKind, TagNode, TagRef, TagTree};

#[cfg(test)]
pub use memory::MemoryStore;
pub use pg::PgStore;

/// Result of a store operation that can legitimately find nothing or collide.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOutcome<T> {
    Ok(T),
    Conflict,
    NotFound,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to acquire DB pool connection: {0}")]
    Pool(#[from] PoolError),
    #[error("database error: {0}")]
    Database(#[from] DieselError),
    #[error("write rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Database(DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

/// Participant column a player or games stat aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStat {
    Placement,
    PlayersEliminated,
    LastRound,
    DamageToPlayers,
}

/// Aggregate of one participant column over a non-empty row set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatAggregate {
    pub count: i64,
    pub min: i32,
    pub avg: f64,
    pub max: i32,
    pub sum: i64,
}

impl StatAggregate {
    /// `None` when no row matched, so an empty set never reads as zeros.
    pub fn from_parts(count: i64, min: Option<i32>, max: Option<i32>, sum: Option<i64>) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let sum = sum?;
        Some(Self {
            count,
            min: min?,
            avg: sum as f64 / count as f64,
            max: max?,
            sum,
        })
    }
}

/// Aggregate of match lengths in seconds over a non-empty match set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthAggregate {
    pub count: i64,
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub sum: f64,
}

impl LengthAggregate {
    pub fn from_parts(count: i64, min: Option<f64>, max: Option<f64>, sum: Option<f64>) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let sum = sum?;
        Some(Self {
            count,
            min: min?,
            avg: sum / count as f64,
            max: max?,
            sum,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageRank {
    Lowest,
    Highest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerDamage {
    pub puuid: String,
    pub damage: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleFilter {
    pub puuid: Option<String>,
    pub region: Option<Region>,
    pub tags: TagIds,
}

pub trait MatchStore: Send + Sync {
    fn match_exists<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>>;

    fn find_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<TagRef>, StoreError>>;

    fn get_or_create_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<TagRef, StoreError>>;

    /// Links `child_id` under `parent_id` in the parent kind's join table. Idempotent.
    fn link_tags<'a>(
        &'a self,
        parent: TagKind,
        parent_id: i32,
        child_id: i32,
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Writes a match and its whole subgraph in one transaction.
    fn commit_match<'a>(
        &'a self,
        graph: &'a MatchGraph,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>>;

    /// Replaces the three tag references of a match, returning the names it held before.
    fn replace_match_tags<'a>(
        &'a self,
        match_id: &'a str,
        tags: &'a ResolvedTags,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>>;

    /// Deletes a match and everything below it, returning the tag names it held.
    fn delete_match<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>>;

    /// Stored match count per tag name combination.
    fn registered_games<'a>(&'a self) -> BoxFuture<'a, Result<Vec<(MatchTags, i64)>, StoreError>>;

    fn create_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        tree: &'a TagTree,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>>;

    fn get_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>>;

    fn list_tag_trees<'a>(
        &'a self,
        kind: TagKind,
    ) -> BoxFuture<'a, Result<Vec<TagNode>, StoreError>>;

    /// Replaces the children linked under a tag.
    fn replace_tag_children<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
        children: &'a [TagTree],
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>>;

    fn delete_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<()>, StoreError>>;

    fn count_tags<'a>(&'a self, kind: TagKind) -> BoxFuture<'a, Result<i64, StoreError>>;

    /// Count, min, average, max and sum of one participant column. `None` when nothing matched.
    fn aggregate_participants<'a>(
        &'a self,
        filter: &'a SampleFilter,
        stat: ParticipantStat,
    ) -> BoxFuture<'a, Result<Option<StatAggregate>, StoreError>>;

    /// Lowest or highest damage dealer. Ties go to the earliest match id, then the best placement.
    fn damage_extreme<'a>(
        &'a self,
        filter: &'a SampleFilter,
        rank: DamageRank,
    ) -> BoxFuture<'a, Result<Option<PlayerDamage>, StoreError>>;

    /// Players of one match by damage dealt, highest first.
    fn game_damage<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Vec<PlayerDamage>, StoreError>>;

    /// Aggregate of the lengths of the matches carrying the given tags.
    fn aggregate_match_lengths<'a>(
        &'a self,
        tags: &'a TagIds,
    ) -> BoxFuture<'a, Result<Option<LengthAggregate>, StoreError>>;
}

impl<T> MatchStore for Arc<T>
where
    T: MatchStore + ?Sized,
{
    fn match_exists<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<bool, StoreError>> {
        (**self).match_exists(match_id)
    }

    fn find_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<TagRef>, StoreError>> {
        (**self).find_tag(kind, name)
    }

    fn get_or_create_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<TagRef, StoreError>> {
        (**self).get_or_create_tag(kind, name)
    }

    fn link_tags<'a>(
        &'a self,
        parent: TagKind,
        parent_id: i32,
        child_id: i32,
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        (**self).link_tags(parent, parent_id, child_id)
    }

    fn commit_match<'a>(
        &'a self,
        graph: &'a MatchGraph,
    ) -> BoxFuture<'a, Result<WriteOutcome, StoreError>> {
        (**self).commit_match(graph)
    }

    fn replace_match_tags<'a>(
        &'a self,
        match_id: &'a str,
        tags: &'a ResolvedTags,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        (**self).replace_match_tags(match_id, tags)
    }

    fn delete_match<'a>(
        &'a self,
        match_id: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<MatchTags>, StoreError>> {
        (**self).delete_match(match_id)
    }

    fn registered_games<'a>(&'a self) -> BoxFuture<'a, Result<Vec<(MatchTags, i64)>, StoreError>> {
        (**self).registered_games()
    }

    fn create_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        tree: &'a TagTree,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        (**self).create_tag_tree(kind, tree)
    }

    fn get_tag_tree<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        (**self).get_tag_tree(kind, name)
    }

    fn list_tag_trees<'a>(
        &'a self,
        kind: TagKind,
    ) -> BoxFuture<'a, Result<Vec<TagNode>, StoreError>> {
        (**self).list_tag_trees(kind)
    }

    fn replace_tag_children<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
        children: &'a [TagTree],
    ) -> BoxFuture<'a, Result<StoreOutcome<TagNode>, StoreError>> {
        (**self).replace_tag_children(kind, name, children)
    }

    fn delete_tag<'a>(
        &'a self,
        kind: TagKind,
        name: &'a str,
    ) -> BoxFuture<'a, Result<StoreOutcome<()>, StoreError>> {
        (**self).delete_tag(kind, name)
    }

    fn count_tags<'a>(&'a self, kind: TagKind) -> BoxFuture<'a, Result<i64, StoreError>> {
        (**self).count_tags(kind)
    }

    fn aggregate_participants<'a>(
        &'a self,
        filter: &'a SampleFilter,
        stat: ParticipantStat,
    ) -> BoxFuture<'a, Result<Option<StatAggregate>, StoreError>> {
        (**self).aggregate_participants(filter, stat)
    }

    fn damage_extreme<'a>(
        &'a self,
        filter: &'a SampleFilter,
        rank: DamageRank,
    ) -> BoxFuture<'a, Result<Option<PlayerDamage>, StoreError>> {
        (**self).damage_extreme(filter, rank)
    }

    fn game_damage<'a>(&'a self, match_id: &'a str) -> BoxFuture<'a, Result<Vec<PlayerDamage>, StoreError>> {
        (**self).game_damage(match_id)
    }

    fn aggregate_match_lengths<'a>(
        &'a self,
        tags: &'a TagIds,
    ) -> BoxFuture<'a, Result<Option<LengthAggregate>, StoreError>> {
        (**self).aggregate_match_lengths(tags)
    }
}
