use crate::build_info;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::metrics::{counter::Counter, gauge::Gauge};
use prometheus_client::registry::Registry;

use crate::tags::{MatchTags, TagKind};

/// Registers immutable build metadata for `/metrics` scraping.
pub fn register_build_info_metric(registry: &mut Registry, prefix: &str) {
    let build_info_metric = Family::<BuildInfoLabels, Gauge>::default();
    build_info_metric
        .get_or_create(&BuildInfoLabels {
            service: "les_stats",
            version: build_info::VERSION,
            commit: build_info::short_commit_hash(),
        })
        .set(1);
    let sub_registry = registry.sub_registry_with_prefix(prefix);
    sub_registry.register(
        "build_info",
        "Build identity labels for this process",
        build_info_metric,
    );
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct BuildInfoLabels {
    service: &'static str,
    version: &'static str,
    commit: &'static str,
}

/// Provider client label, one value per title.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ClientLabels {
    pub client: String,
}

impl ClientLabels {
    pub fn new(client: &str) -> Self {
        Self {
            client: client.to_string(),
        }
    }
}

/// Label set of the games-registered gauge. Absent tags encode as an empty string.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct GameLabels {
    pub game: String,
    pub event: String,
    pub tournament: String,
    pub stage: String,
}

impl GameLabels {
    pub fn new(game: &str, tags: &MatchTags) -> Self {
        Self {
            game: game.to_string(),
            event: tags.event.clone().unwrap_or_default(),
            tournament: tags.tournament.clone().unwrap_or_default(),
            stage: tags.stage.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TagLabels {
    pub kind: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub operation: &'static str,
    pub status: String,
}

fn latency_histogram() -> Histogram {
    // 10ms .. ~20s
    Histogram::new(exponential_buckets(0.01, 2.0, 12))
}

#[derive(Clone)]
pub struct ProviderMetrics {
    /// Latency of provider calls that answered 2xx.
    pub success_seconds: Family<ClientLabels, Histogram, fn() -> Histogram>,
    /// Latency of every other outcome, including transport failures and timeouts.
    pub failed_seconds: Family<ClientLabels, Histogram, fn() -> Histogram>,
    /// Provider answers with status 429.
    pub rate_limited_total: Family<ClientLabels, Counter>,
}

impl ProviderMetrics {
    fn init() -> Self {
        Self {
            success_seconds: Family::new_with_constructor(latency_histogram),
            failed_seconds: Family::new_with_constructor(latency_histogram),
            rate_limited_total: Family::default(),
        }
    }

    pub fn register(registry: &mut Registry, prefix: &str) -> Self {
        let metrics = Self::init();
        let sub_registry = registry.sub_registry_with_prefix(prefix);
        sub_registry.register(
            "request_success_seconds",
            "Latency of successful provider requests",
            metrics.success_seconds.clone(),
        );
        sub_registry.register(
            "request_failed_seconds",
            "Latency of failed provider requests",
            metrics.failed_seconds.clone(),
        );
        sub_registry.register(
            "request_rate_limited",
            "Provider requests answered with 429",
            metrics.rate_limited_total.clone(),
        );
        metrics
    }
}

#[derive(Clone)]
pub struct IngestMetrics {
    /// Matches currently stored, by title and tag names.
    pub games_registered: Family<GameLabels, Gauge>,
    /// Stored tags per kind.
    pub tags: Family<TagLabels, Gauge>,
    /// Per-item outcomes of save, update and delete batches.
    pub items_total: Family<OutcomeLabels, Counter>,
}

impl IngestMetrics {
    fn init() -> Self {
        Self {
            games_registered: Family::default(),
            tags: Family::default(),
            items_total: Family::default(),
        }
    }

    pub fn register(registry: &mut Registry, prefix: &str) -> Self {
        let metrics = Self::init();
        let sub_registry = registry.sub_registry_with_prefix(prefix);
        sub_registry.register(
            "games_registered",
            "Number of games registered per title and tag",
            metrics.games_registered.clone(),
        );
        sub_registry.register(
            "tags",
            "Number of stored events, tournaments and stages",
            metrics.tags.clone(),
        );
        sub_registry.register(
            "items",
            "Per-item outcomes of ingestion batches",
            metrics.items_total.clone(),
        );
        metrics
    }

    pub fn game_registered(&self, game: &str, tags: &MatchTags) {
        self.games_registered
            .get_or_create(&GameLabels::new(game, tags))
            .inc();
    }

    pub fn game_unregistered(&self, game: &str, tags: &MatchTags) {
        self.games_registered
            .get_or_create(&GameLabels::new(game, tags))
            .dec();
    }

    pub fn set_games_registered(&self, game: &str, tags: &MatchTags, count: i64) {
        self.games_registered
            .get_or_create(&GameLabels::new(game, tags))
            .set(count);
    }

    pub fn set_tag_count(&self, kind: TagKind, count: i64) {
        self.tags
            .get_or_create(&TagLabels {
                kind: kind.as_str(),
            })
            .set(count);
    }

    pub fn tag_deleted(&self, kind: TagKind) {
        self.tags
            .get_or_create(&TagLabels {
                kind: kind.as_str(),
            })
            .dec();
    }

    pub fn item_outcome(&self, operation: &'static str, status: u16) {
        self.items_total
            .get_or_create(&OutcomeLabels {
                operation,
                status: status.to_string(),
            })
            .inc();
    }
}

/// Every metric handle the service records into.
#[derive(Clone)]
pub struct Metrics {
    pub provider: ProviderMetrics,
    pub ingest: IngestMetrics,
}

impl Metrics {
    pub fn register(registry: &mut Registry) -> Self {
        register_build_info_metric(registry, "les_stats");
        Self {
            provider: ProviderMetrics::register(registry, "riot"),
            ingest: IngestMetrics::register(registry, "ingest"),
        }
    }

    /// Metrics recorded into a throwaway registry.
    pub fn detached() -> Self {
        Self::register(&mut Registry::default())
    }
}
