use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

/// One outbound call of a dispatcher batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRequest {
    pub method: Method,
    /// Path below the base url, one entry per segment. Each entry is percent-encoded as a
    /// single segment, so `/` inside an id never reaches another endpoint.
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    /// Overrides the title's default routing for this call.
    pub routing: Option<String>,
}

impl ProviderRequest {
    pub fn get<S: Into<String>>(segments: impl IntoIterator<Item = S>) -> Self {
        Self {
            method: Method::GET,
            segments: segments.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            routing: None,
        }
    }

    /// Unencoded path, for logs.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_routing(mut self, routing: impl Into<String>) -> Self {
        self.routing = Some(routing.into());
        self
    }
}

/// What came back for one call, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutcome {
    /// The provider answered. `body` is parsed JSON, or a JSON string for non-JSON bodies,
    /// or `Value::Null` when the body was empty.
    Response {
        status: u16,
        body: Value,
        elapsed: Duration,
    },
    /// Connection, TLS or body read failure.
    Transport { message: String, elapsed: Duration },
    /// The per-call deadline expired.
    TimedOut { elapsed: Duration },
    /// The request could not be turned into a url. Nothing was sent.
    Rejected { message: String },
}

impl RawOutcome {
    pub fn elapsed(&self) -> Duration {
        match self {
            Self::Response { elapsed, .. }
            | Self::Transport { elapsed, .. }
            | Self::TimedOut { elapsed } => *elapsed,
            Self::Rejected { .. } => Duration::ZERO,
        }
    }
}

/// Paging and time window for match list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchListQuery {
    pub start: u32,
    pub count: u32,
    /// Epoch seconds.
    pub start_time: Option<i64>,
    /// Epoch seconds.
    pub end_time: Option<i64>,
}

impl Default for MatchListQuery {
    fn default() -> Self {
        Self {
            start: 0,
            count: 20,
            start_time: None,
            end_time: None,
        }
    }
}

pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
