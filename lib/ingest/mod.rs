//! Match ingestion: save, retag and delete batches of TFT matches.
//!
//! Each item moves through `pending → tags-resolved → fetched → validated → committed` and
//! can be rejected at any step without affecting its siblings. Surviving items are fetched
//! from the provider in a single batch.

pub mod filter;
pub mod graph;
pub mod payload;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use futures::future::{join_all, BoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::envelope::{BatchResponse, Envelope};
use crate::logging::format_error_report;
use crate::riot_client::RiotClient;
use crate::server::monitoring::IngestMetrics;
use crate::store::{MatchStore, StoreError, StoreOutcome};
use crate::tags::{resolve_tags, ResolvedTags, TagInput, TagKind, TagRequest, TagResolution};

pub use filter::{FilterRejection, ParticipantFilter};
use graph::{MatchGraph, PayloadError};
use writer::WriteOutcome;

/// Game label used on ingestion metrics.
pub const GAME_LABEL: &str = "tft";

/// Fetches raw match payloads, one envelope per id, in id order.
pub trait MatchFetcher: Send + Sync {
    fn fetch_matches<'a>(&'a self, match_ids: &'a [String]) -> BoxFuture<'a, Vec<Envelope<Value>>>;

    /// Region stored for players when the match id carries no known platform.
    fn fallback_region(&self) -> String;
}

impl<T> MatchFetcher for Arc<T>
where
    T: MatchFetcher + ?Sized,
{
    fn fetch_matches<'a>(&'a self, match_ids: &'a [String]) -> BoxFuture<'a, Vec<Envelope<Value>>> {
        (**self).fetch_matches(match_ids)
    }

    fn fallback_region(&self) -> String {
        (**self).fallback_region()
    }
}

impl MatchFetcher for RiotClient {
    fn fetch_matches<'a>(&'a self, match_ids: &'a [String]) -> BoxFuture<'a, Vec<Envelope<Value>>> {
        Box::pin(async move { self.get_matches(match_ids).await.items })
    }

    fn fallback_region(&self) -> String {
        self.title_config().credentials().routing.clone()
    }
}

/// One entry of a save or update body: `{"id": ..., "event"?, "tournament"?, "stage"?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveItem {
    pub id: String,
    #[serde(flatten)]
    pub tags: TagRequest,
}

impl SaveItem {
    pub fn untagged(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tags: TagRequest::default(),
        }
    }

    fn defines_tags(&self) -> bool {
        [&self.tags.event, &self.tags.tournament, &self.tags.stage]
            .into_iter()
            .any(|input| matches!(input, Some(TagInput::Define { .. })))
    }
}

type ItemResult = (u16, Envelope<String>);

fn reject(status: u16, message: impl Into<Value>) -> ItemResult {
    (status, Envelope::error(status, message))
}

enum Prepared {
    Ready(ResolvedTags),
    Done(ItemResult),
}

pub struct IngestService<S, F> {
    store: S,
    fetcher: F,
    metrics: IngestMetrics,
}

impl<S, F> IngestService<S, F>
where
    S: MatchStore,
    F: MatchFetcher,
{
    pub fn new(store: S, fetcher: F, metrics: IngestMetrics) -> Self {
        Self {
            store,
            fetcher,
            metrics,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sets the game and tag gauges from what is already stored.
    pub async fn seed_metrics(&self) -> Result<(), StoreError> {
        for (tags, count) in self.store.registered_games().await? {
            self.metrics.set_games_registered(GAME_LABEL, &tags, count);
        }
        self.refresh_tag_counts().await
    }

    async fn refresh_tag_counts(&self) -> Result<(), StoreError> {
        for kind in TagKind::ALL {
            let count = self.store.count_tags(kind).await?;
            self.metrics.set_tag_count(kind, count);
        }
        Ok(())
    }

    pub async fn save_batch(
        &self,
        items: &[SaveItem],
        filter: &ParticipantFilter,
    ) -> BatchResponse<String> {
        let prepared = join_all(items.iter().map(|item| self.prepare(item))).await;

        let mut results: Vec<Option<ItemResult>> = Vec::with_capacity(items.len());
        let mut pending = Vec::new();
        for (index, state) in prepared.into_iter().enumerate() {
            match state {
                Prepared::Done(result) => results.push(Some(result)),
                Prepared::Ready(tags) => {
                    results.push(None);
                    pending.push((index, tags));
                }
            }
        }

        if !pending.is_empty() {
            let ids = pending
                .iter()
                .map(|(index, _)| items[*index].id.clone())
                .collect::<Vec<_>>();
            let fetched = self.fetcher.fetch_matches(&ids).await;
            let fallback_region = self.fetcher.fallback_region();

            let committed = join_all(pending.iter().zip(fetched).map(
                |((index, tags), envelope)| {
                    self.commit_fetched(&items[*index].id, envelope, tags, filter, &fallback_region)
                },
            ))
            .await;

            for ((index, _), result) in pending.iter().zip(committed) {
                results[*index] = Some(result);
            }
        }

        if items.iter().any(SaveItem::defines_tags) {
            if let Err(err) = self.refresh_tag_counts().await {
                error!(
                    event = "tag_gauge_refresh_failed",
                    error = %format_error_report(&err),
                    "could not refresh tag gauges"
                );
            }
        }

        self.finish("save", results.into_iter().flatten())
    }

    async fn prepare(&self, item: &SaveItem) -> Prepared {
        match self.store.match_exists(&item.id).await {
            Ok(true) => {
                return Prepared::Done(reject(409, format!("{} already exists", item.id)));
            }
            Ok(false) => {}
            Err(err) => return Prepared::Done(storage_failure("save", &item.id, &err)),
        }

        match resolve_tags(&self.store, &item.tags).await {
            Ok(TagResolution::Resolved(tags)) => Prepared::Ready(tags),
            Ok(TagResolution::NotFound(miss)) => {
                Prepared::Done((404, miss.envelope()))
            }
            Err(err) => Prepared::Done(storage_failure("save", &item.id, &err)),
        }
    }

    async fn commit_fetched(
        &self,
        match_id: &str,
        envelope: Envelope<Value>,
        tags: &ResolvedTags,
        filter: &ParticipantFilter,
        fallback_region: &str,
    ) -> ItemResult {
        let payload = match envelope {
            Envelope {
                data: Some(payload),
                error: None,
            } => payload,
            Envelope {
                error: Some(error),
                ..
            } => return (error.status_code, Envelope::error(error.status_code, error.message)),
            Envelope { .. } => {
                return reject(PayloadError::STATUS, format!("empty response for {match_id}"))
            }
        };

        let graph = match MatchGraph::from_payload(payload, match_id, fallback_region, tags) {
            Ok(graph) => graph,
            Err(err) => return reject(PayloadError::STATUS, err.to_string()),
        };

        if let Err(rejection) = filter.check(&graph) {
            info!(
                event = "match_filtered",
                match_id,
                matched = rejection.matched,
                needed = rejection.needed,
                "match skipped by participant filter"
            );
            return (FilterRejection::STATUS, Envelope::data(rejection.message()));
        }

        match self.store.commit_match(&graph).await {
            Ok(WriteOutcome::Written) => {
                self.metrics.game_registered(GAME_LABEL, &graph.tags);
                info!(
                    event = "match_saved",
                    match_id,
                    participants = graph.participants.len(),
                    "saved match"
                );
                (200, Envelope::data(format!("{match_id} saved")))
            }
            Ok(WriteOutcome::Duplicate) => reject(409, format!("{match_id} already exists")),
            Err(err) => storage_failure("save", match_id, &err),
        }
    }

    /// Replaces the tags of stored matches. Participants are left untouched.
    pub async fn update_batch(&self, items: &[SaveItem]) -> BatchResponse<String> {
        let results = join_all(items.iter().map(|item| self.update_one(item))).await;
        if items.iter().any(SaveItem::defines_tags) {
            if let Err(err) = self.refresh_tag_counts().await {
                error!(
                    event = "tag_gauge_refresh_failed",
                    error = %format_error_report(&err),
                    "could not refresh tag gauges"
                );
            }
        }
        self.finish("update", results)
    }

    async fn update_one(&self, item: &SaveItem) -> ItemResult {
        let tags = match resolve_tags(&self.store, &item.tags).await {
            Ok(TagResolution::Resolved(tags)) => tags,
            Ok(TagResolution::NotFound(miss)) => return (404, miss.envelope()),
            Err(err) => return storage_failure("update", &item.id, &err),
        };

        match self.store.replace_match_tags(&item.id, &tags).await {
            Ok(StoreOutcome::Ok(previous)) => {
                self.metrics.game_unregistered(GAME_LABEL, &previous);
                self.metrics.game_registered(GAME_LABEL, &tags.names());
                (200, Envelope::data(format!("{} updated", item.id)))
            }
            Ok(StoreOutcome::NotFound) => reject(404, format!("{} not found", item.id)),
            Ok(StoreOutcome::Conflict) => reject(409, format!("{} is being modified", item.id)),
            Err(err) => storage_failure("update", &item.id, &err),
        }
    }

    pub async fn delete_batch(&self, match_ids: &[String]) -> BatchResponse<String> {
        let results = join_all(match_ids.iter().map(|id| self.delete_one(id))).await;
        self.finish("delete", results)
    }

    async fn delete_one(&self, match_id: &str) -> ItemResult {
        match self.store.delete_match(match_id).await {
            Ok(StoreOutcome::Ok(tags)) => {
                self.metrics.game_unregistered(GAME_LABEL, &tags);
                info!(event = "match_deleted", match_id, "deleted match");
                (200, Envelope::data(format!("{match_id} deleted")))
            }
            Ok(StoreOutcome::NotFound) => reject(404, format!("{match_id} not found")),
            Ok(StoreOutcome::Conflict) => reject(409, format!("{match_id} is being modified")),
            Err(err) => storage_failure("delete", match_id, &err),
        }
    }

    fn finish(
        &self,
        operation: &'static str,
        results: impl IntoIterator<Item = ItemResult>,
    ) -> BatchResponse<String> {
        results
            .into_iter()
            .inspect(|(status, _)| self.metrics.item_outcome(operation, *status))
            .collect()
    }
}

fn storage_failure(operation: &'static str, match_id: &str, err: &StoreError) -> ItemResult {
    error!(
        event = "match_storage_failed",
        operation,
        match_id,
        error = %format_error_report(err),
        "storage failure while processing match"
    );
    reject(500, format!("storage error while processing {match_id}"))
}
