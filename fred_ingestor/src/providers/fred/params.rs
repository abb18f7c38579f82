//! Query construction and retry pacing for the FRED API.

use std::time::Duration;

use rand::Rng;

use crate::models::request_params::ObservationRequest;

/// Base delay before the first retry.
pub const BACKOFF_BASE_MS: u64 = 500;
/// Ceiling on any single backoff delay.
pub const BACKOFF_CAP_MS: u64 = 8_000;
/// Jitter applied to each delay, as a fraction of the delay.
pub const BACKOFF_JITTER: f64 = 0.2;

/// Soft per-request deadline, enforced as the HTTP client timeout.
pub const SOFT_DEADLINE: Duration = Duration::from_secs(30);
/// Hard per-operation deadline covering retries.
pub const HARD_DEADLINE: Duration = Duration::from_secs(60);

/// Query pairs for an observations request. Omitted bounds are omitted
/// from the query so the provider returns full history.
pub fn observation_query(req: &ObservationRequest) -> Vec<(String, String)> {
    let mut query = vec![("series_id".to_string(), req.series_id.clone())];
    if let Some(start) = req.start {
        query.push((
            "observation_start".to_string(),
            start.format("%Y-%m-%d").to_string(),
        ));
    }
    if let Some(end) = req.end {
        query.push((
            "observation_end".to_string(),
            end.format("%Y-%m-%d").to_string(),
        ));
    }
    query
}

/// Exponential backoff with jitter for retry `attempt` (1-based):
/// `base * 2^(attempt-1)` capped, then ±20% jitter.
pub fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE_MS.saturating_mul(1u64 << (attempt.saturating_sub(1)).min(10));
    let capped = exp.min(BACKOFF_CAP_MS) as f64;
    let jitter = rand::thread_rng().gen_range(-BACKOFF_JITTER..=BACKOFF_JITTER);
    Duration::from_millis((capped * (1.0 + jitter)).max(0.0) as u64)
}
