use std::collections::HashMap;
use std::sync::Arc;

use prometheus_client::registry::Registry;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::auth::{CapabilityCheck, StaticKeys};
use crate::config::Config;
use crate::ingest::{IngestService, MatchFetcher};
use crate::riot_client::{RiotClient, RiotClientError, Title};
use crate::server::monitoring::Metrics;
use crate::store::MatchStore;

pub type SharedIngest = IngestService<Arc<dyn MatchStore>, Arc<dyn MatchFetcher>>;

pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    /// Provider clients of the titles that have credentials.
    pub providers: HashMap<Title, RiotClient>,
    /// Present once a TFT match source is configured.
    pub ingest: Option<SharedIngest>,
    pub auth: Arc<dyn CapabilityCheck>,
    pub metrics: Metrics,
    pub registry: RwLock<Registry>,
    pub shutdown_token: CancellationToken,
    pub max_batch_size: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MatchStore>,
        auth: Arc<dyn CapabilityCheck>,
        max_batch_size: usize,
        shutdown_token: CancellationToken,
    ) -> Self {
        let mut registry = Registry::default();
        let metrics = Metrics::register(&mut registry);
        Self {
            store,
            providers: HashMap::new(),
            ingest: None,
            auth,
            metrics,
            registry: RwLock::new(registry),
            shutdown_token,
            max_batch_size,
        }
    }

    /// Builds the state for the running service: static keys from the config and one
    /// provider client per configured title.
    pub fn from_config(
        config: &Config,
        store: Arc<dyn MatchStore>,
        shutdown_token: CancellationToken,
    ) -> Result<Self, RiotClientError> {
        let mut state = Self::new(
            store,
            Arc::new(StaticKeys::new(config.api_keys.clone())),
            config.max_batch_size,
            shutdown_token,
        );
        for title in [Title::Tft, Title::Lol, Title::Valorant] {
            if let Some(title_config) = config.title(title) {
                let client = RiotClient::new(
                    title_config,
                    &config.riot_base_url,
                    config.request_timeout,
                    state.metrics.provider.clone(),
                )?;
                state = state.with_provider(client);
            }
        }
        Ok(state)
    }

    /// Registers a provider client. A TFT client also becomes the match source for
    /// ingestion unless one was set explicitly.
    pub fn with_provider(mut self, client: RiotClient) -> Self {
        if client.title() == Title::Tft && self.ingest.is_none() {
            self = self.with_fetcher(Arc::new(client.clone()));
        }
        self.providers.insert(client.title(), client);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn MatchFetcher>) -> Self {
        self.ingest = Some(IngestService::new(
            self.store.clone(),
            fetcher,
            self.metrics.ingest.clone(),
        ));
        self
    }

    pub fn provider(&self, title: Title) -> Option<&RiotClient> {
        self.providers.get(&title)
    }
}
