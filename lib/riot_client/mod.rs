pub mod classify;
pub mod error;
pub mod region;
pub mod request;
pub mod title;


use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use crate::envelope::BatchResponse;
use crate::server::monitoring::ProviderMetrics;

pub use classify::classify;
pub use error::RiotClientError;
pub use request::{MatchListQuery, ProviderRequest, RawOutcome};
pub use title::{Title, TitleConfig, TitleCredentials};

const RIOT_TOKEN_HEADER: &str = "X-Riot-Token";
const ROUTING_PLACEHOLDER: &str = "{routing}";

/// Provider client for one title.
///
/// Holds a single `reqwest::Client`, so every call of every batch shares one connection pool.
/// Batches are not rate limited locally; 429s are surfaced per item and counted.
#[derive(Clone)]
pub struct RiotClient {
    http: reqwest::Client,
    title: TitleConfig,
    base_url: String,
    timeout: Duration,
    metrics: ProviderMetrics,
}

impl RiotClient {
    pub fn new(
        title: TitleConfig,
        base_url: &str,
        timeout: Duration,
        metrics: ProviderMetrics,
    ) -> Result<Self, RiotClientError> {
        let probe = base_url.replace(ROUTING_PLACEHOLDER, "americas");
        Url::parse(&probe).map_err(|_| RiotClientError::InvalidBaseUrl(base_url.to_string()))?;

        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            title,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            metrics,
        })
    }

    pub fn title(&self) -> Title {
        self.title.title()
    }

    pub fn title_config(&self) -> &TitleConfig {
        &self.title
    }

    /// Base url with routing filled in and every request segment appended percent-encoded.
    ///
    /// `.`, `..` and empty segments are refused rather than resolved against the base path.
    fn url_for(&self, request: &ProviderRequest) -> Result<Url, RiotClientError> {
        if let Some(segment) = request
            .segments
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(RiotClientError::InvalidSegment(segment.clone()));
        }

        let routing = request
            .routing
            .as_deref()
            .unwrap_or(&self.title.credentials().routing);
        let base = self.base_url.replace(ROUTING_PLACEHOLDER, routing);
        let mut url =
            Url::parse(&base).map_err(|_| RiotClientError::InvalidBaseUrl(self.base_url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| RiotClientError::InvalidBaseUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(&request.segments);
        Ok(url)
    }

    /// Issues every request concurrently and returns one outcome per request, in request order.
    pub async fn dispatch(&self, requests: &[ProviderRequest]) -> Vec<RawOutcome> {
        join_all(requests.iter().map(|request| self.execute(request))).await
    }

    /// One call under the per-call deadline. Never fails; failures become outcomes.
    pub async fn execute(&self, request: &ProviderRequest) -> RawOutcome {
        let started = Instant::now();
        let url = match self.url_for(request) {
            Ok(url) => url,
            Err(err) => {
                warn!(
                    event = "provider_request_rejected",
                    client = self.title().as_str(),
                    path = %request.path(),
                    error = %err,
                    "provider request not sent"
                );
                return RawOutcome::Rejected {
                    message: err.to_string(),
                };
            }
        };

        let call = async {
            let response = self
                .http
                .request(request.method.clone(), url.clone())
                .header(RIOT_TOKEN_HEADER, &self.title.credentials().api_key)
                .query(&request.query)
                .send()
                .await?;
            let status = response.status().as_u16();
            let text = response.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok((status, text))) => {
                let elapsed = started.elapsed();
                debug!(
                    event = "provider_response",
                    client = self.title().as_str(),
                    path = %request.path(),
                    status,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "provider answered"
                );
                RawOutcome::Response {
                    status,
                    body: request::parse_body(&text),
                    elapsed,
                }
            }
            Ok(Err(err)) => {
                warn!(
                    event = "provider_transport_failed",
                    client = self.title().as_str(),
                    path = %request.path(),
                    error = %err,
                    "provider call failed before a response"
                );
                RawOutcome::Transport {
                    message: err.to_string(),
                    elapsed: started.elapsed(),
                }
            }
            Err(_) => {
                warn!(
                    event = "provider_timed_out",
                    client = self.title().as_str(),
                    path = %request.path(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "provider call timed out"
                );
                RawOutcome::TimedOut {
                    elapsed: started.elapsed(),
                }
            }
        }
    }

    /// Dispatches and classifies a batch.
    pub async fn fetch(&self, requests: &[ProviderRequest]) -> BatchResponse<Value> {
        self.dispatch(requests)
            .await
            .into_iter()
            .map(|outcome| classify(outcome, &self.metrics, self.title().as_str()))
            .collect()
    }

    pub fn match_request(&self, match_id: &str) -> ProviderRequest {
        ProviderRequest::get(self.title.match_path(match_id))
            .with_routing(self.title.match_routing(match_id))
    }

    pub async fn get_matches(&self, match_ids: &[String]) -> BatchResponse<Value> {
        let requests: Vec<_> = match_ids.iter().map(|id| self.match_request(id)).collect();
        self.fetch(&requests).await
    }

    pub async fn get_match_lists(
        &self,
        puuids: &[String],
        query: &MatchListQuery,
    ) -> BatchResponse<Value> {
        let requests: Vec<_> = puuids
            .iter()
            .map(|puuid| {
                let mut request = ProviderRequest::get(self.title.match_list_path(puuid));
                if self.title.match_list_is_paged() {
                    request = request
                        .with_query("start", query.start)
                        .with_query("count", query.count);
                    if let Some(start_time) = query.start_time {
                        request = request.with_query("startTime", start_time);
                    }
                    if let Some(end_time) = query.end_time {
                        request = request.with_query("endTime", end_time);
                    }
                }
                request
            })
            .collect();
        self.fetch(&requests).await
    }

    pub async fn get_summoners_by_puuid(&self, puuids: &[String]) -> BatchResponse<Value> {
        let requests: Vec<_> = puuids
            .iter()
            .map(|puuid| ProviderRequest::get(self.title.summoner_by_puuid_path(puuid)))
            .collect();
        self.fetch(&requests).await
    }

    pub async fn get_summoners_by_name(
        &self,
        names: &[String],
    ) -> Result<BatchResponse<Value>, RiotClientError> {
        let requests = names
            .iter()
            .map(|name| {
                self.title
                    .summoner_by_name_path(name)
                    .map(ProviderRequest::get)
                    .ok_or(RiotClientError::Unsupported {
                        title: self.title().as_str(),
                        operation: "summoner lookup by name",
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self.fetch(&requests).await)
    }
}
