//! Uniform per-item response shape and the batch status reduction.
//!
//! Every item of a fan-out (provider reads, saves, updates, deletes) ends up as one
//! [`Envelope`]. A batch keeps its envelopes in request order and folds their status codes
//! into one overall status with [`StatusAggregator`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Overall status for a batch whose items did not all share one status.
pub const MULTI_STATUS: u16 = 207;

/// Error half of an [`Envelope`].
///
/// `message` is whatever the producer handed us: a plain string for local failures, or the
/// provider's own JSON body, which stays opaque here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub status_code: u16,
    pub message: Value,
}

impl ErrorInfo {
    pub fn new(status_code: u16, message: impl Into<Value>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }
}

/// `{data, error}` wrapper. Exactly one side is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub data: Option<T>,
    pub error: Option<ErrorInfo>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }

    pub fn error(status_code: u16, message: impl Into<Value>) -> Self {
        Self {
            data: None,
            error: Some(ErrorInfo::new(status_code, message)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            data: self.data.map(f),
            error: self.error,
        }
    }
}

/// Folds per-item status codes into one batch status.
///
/// The first status seeds the aggregate. Any later status that differs flips the aggregate to
/// 207, and it never leaves 207 afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusAggregator {
    current: Option<u16>,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, status: u16) {
        self.current = match self.current {
            None => Some(status),
            Some(MULTI_STATUS) => Some(MULTI_STATUS),
            Some(current) if current == status => Some(current),
            Some(_) => Some(MULTI_STATUS),
        };
    }

    /// `None` when nothing was pushed.
    pub fn status(&self) -> Option<u16> {
        self.current
    }
}

impl Extend<u16> for StatusAggregator {
    fn extend<I: IntoIterator<Item = u16>>(&mut self, iter: I) {
        for status in iter {
            self.push(status);
        }
    }
}

impl FromIterator<u16> for StatusAggregator {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        let mut aggregator = Self::new();
        aggregator.extend(iter);
        aggregator
    }
}

/// Ordered envelopes plus the status they reduce to.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResponse<T = Value> {
    pub status: Option<u16>,
    pub items: Vec<Envelope<T>>,
}

impl<T> BatchResponse<T> {
    /// Aggregate status, or `fallback` for an empty batch.
    pub fn status_or(&self, fallback: u16) -> u16 {
        self.status.unwrap_or(fallback)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> FromIterator<(u16, Envelope<T>)> for BatchResponse<T> {
    fn from_iter<I: IntoIterator<Item = (u16, Envelope<T>)>>(iter: I) -> Self {
        let mut aggregator = StatusAggregator::new();
        let mut items = Vec::new();
        for (status, envelope) in iter {
            aggregator.push(status);
            items.push(envelope);
        }
        Self {
            status: aggregator.status(),
            items,
        }
    }
}
