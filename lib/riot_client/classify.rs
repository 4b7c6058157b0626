use reqwest::StatusCode;
use serde_json::Value;

use super::request::RawOutcome;
use crate::envelope::Envelope;
use crate::server::monitoring::{ClientLabels, ProviderMetrics};

pub const BAD_REQUEST: u16 = 400;
pub const BAD_GATEWAY: u16 = 502;
pub const GATEWAY_TIMEOUT: u16 = 504;
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Turns a raw outcome into an envelope plus the status it contributes to the batch.
///
/// Never fails. Records latency into the success or failure histogram and counts 429s.
pub fn classify(
    outcome: RawOutcome,
    metrics: &ProviderMetrics,
    client: &str,
) -> (u16, Envelope<Value>) {
    let labels = ClientLabels::new(client);
    let elapsed = outcome.elapsed().as_secs_f64();

    match outcome {
        RawOutcome::Response { status, body, .. } if is_success(status) => {
            metrics.success_seconds.get_or_create(&labels).observe(elapsed);
            (status, Envelope::data(or_reason_phrase(body, status)))
        }
        RawOutcome::Response { status, body, .. } => {
            metrics.failed_seconds.get_or_create(&labels).observe(elapsed);
            if status == TOO_MANY_REQUESTS {
                metrics.rate_limited_total.get_or_create(&labels).inc();
            }
            (status, Envelope::error(status, or_reason_phrase(body, status)))
        }
        RawOutcome::Transport { message, .. } => {
            metrics.failed_seconds.get_or_create(&labels).observe(elapsed);
            (BAD_GATEWAY, Envelope::error(BAD_GATEWAY, message))
        }
        RawOutcome::Rejected { message } => (BAD_REQUEST, Envelope::error(BAD_REQUEST, message)),
        RawOutcome::TimedOut { elapsed } => {
            metrics.failed_seconds.get_or_create(&labels).observe(elapsed.as_secs_f64());
            (
                GATEWAY_TIMEOUT,
                Envelope::error(
                    GATEWAY_TIMEOUT,
                    format!("request timed out after {}ms", elapsed.as_millis()),
                ),
            )
        }
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Empty provider bodies read as `Value::Null`; an envelope side must never be null.
fn or_reason_phrase(body: Value, status: u16) -> Value {
    match body {
        Value::Null => Value::String(reason_phrase(status)),
        other => other,
    }
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Status")
        .to_string()
}
