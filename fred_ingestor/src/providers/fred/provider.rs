//! The FRED gateway: outbound HTTP, retry/backoff, and rate-limit respect.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use shared_utils::config::AppConfig;
use thiserror::Error;

use crate::models::directory::{CategoryInfo, ReleaseInfo, SourceInfo};
use crate::models::request_params::ObservationRequest;
use crate::models::series::{Series, SeriesMeta};
use crate::providers::errors::GatewayError;
use crate::providers::fred::params::{
    HARD_DEADLINE, SOFT_DEADLINE, backoff_delay, observation_query,
};
use crate::providers::fred::response::{
    CategoriesEnvelope, FredErrorBody, ObservationsEnvelope, ReleasesEnvelope, SeriesEnvelope,
    SourcesEnvelope,
};
use crate::providers::SeriesProvider;

const BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// FRED caps a single page of search results at 1000 items.
const SEARCH_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Error)]
pub enum ProviderInitError {
    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

pub struct FredProvider {
    client: Client,
    api_key: SecretString,
    limiter: DefaultDirectRateLimiter,
    retry_budget: u32,
}

impl FredProvider {
    /// Creates a new provider from the application configuration.
    ///
    /// The credential itself was validated to exist at startup; a rejected
    /// key surfaces later as [`GatewayError::AuthMissing`].
    pub fn new(config: &AppConfig) -> Result<Self, ProviderInitError> {
        let client = Client::builder().timeout(SOFT_DEADLINE).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            // FRED's documented courtesy limit of 120 requests/minute.
            limiter: RateLimiter::direct(Quota::per_minute(nonzero!(120u32))),
            retry_budget: config.retry_budget,
        })
    }

    /// One GET against `path` with retry/backoff, rate limiting, and the
    /// hard per-operation deadline.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, GatewayError> {
        tokio::time::timeout(HARD_DEADLINE, self.get_json_with_retries(path, query))
            .await
            .map_err(|_| {
                GatewayError::UpstreamUnavailable(format!(
                    "hard deadline of {}s exceeded",
                    HARD_DEADLINE.as_secs()
                ))
            })?
    }

    async fn get_json_with_retries<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, GatewayError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            self.limiter.until_ready().await;
            match self.send_once(path, &query).await {
                Err(err) if err.is_retryable() && attempt < self.retry_budget => {
                    let delay = backoff_delay(attempt);
                    tracing::warn!(
                        path,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying gateway call"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{BASE_URL}/{path}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[
                ("api_key", self.api_key.expose_secret()),
                ("file_type", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

/// Maps a non-2xx response onto the error taxonomy. FRED reports most
/// problems as 400 with a JSON `error_message`; the message text is the
/// only way to tell a bad key from a bad argument.
fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return GatewayError::RateLimited;
    }
    if status.is_server_error() {
        return GatewayError::UpstreamUnavailable(format!("upstream returned {status}"));
    }
    let message = serde_json::from_str::<FredErrorBody>(body)
        .map(|b| b.error_message)
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.to_string()
            } else {
                body.to_string()
            }
        });
    if message.to_ascii_lowercase().contains("api_key") {
        GatewayError::AuthMissing(message)
    } else {
        GatewayError::InvalidArgument(message)
    }
}

/// Rewrites a 400 "does not exist" rejection into `NotFound` carrying the
/// identifier the caller asked for.
fn map_not_found(err: GatewayError, id: &str) -> GatewayError {
    match err {
        GatewayError::InvalidArgument(msg)
            if msg.to_ascii_lowercase().contains("does not exist")
                || msg.to_ascii_lowercase().contains("not found") =>
        {
            GatewayError::NotFound {
                series_id: id.to_string(),
            }
        }
        other => other,
    }
}

#[async_trait]
impl SeriesProvider for FredProvider {
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<SeriesMeta>, GatewayError> {
        let mut results: Vec<SeriesMeta> = Vec::new();
        let mut offset = 0usize;
        // Accumulate pages until the caller's limit is met or the
        // provider runs dry, mirroring upstream pagination.
        loop {
            let page_limit = (limit - results.len()).min(SEARCH_PAGE_LIMIT);
            if page_limit == 0 {
                break;
            }
            let envelope: SeriesEnvelope = self
                .get_json(
                    "series/search",
                    vec![
                        ("search_text".to_string(), text.to_string()),
                        ("limit".to_string(), page_limit.to_string()),
                        ("offset".to_string(), offset.to_string()),
                    ],
                )
                .await?;
            let page_len = envelope.seriess.len();
            for item in envelope.seriess {
                results.push(item.into_meta()?);
            }
            if page_len < page_limit {
                break;
            }
            offset += page_len;
        }
        Ok(results)
    }

    async fn series_meta(&self, series_id: &str) -> Result<SeriesMeta, GatewayError> {
        let envelope: SeriesEnvelope = self
            .get_json(
                "series",
                vec![("series_id".to_string(), series_id.to_string())],
            )
            .await
            .map_err(|e| map_not_found(e, series_id))?;
        envelope
            .seriess
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound {
                series_id: series_id.to_string(),
            })?
            .into_meta()
    }

    async fn observations(&self, req: &ObservationRequest) -> Result<Series, GatewayError> {
        let meta = self.series_meta(&req.series_id).await?;
        let envelope: ObservationsEnvelope = self
            .get_json("series/observations", observation_query(req))
            .await
            .map_err(|e| map_not_found(e, &req.series_id))?;

        let mut observations = Vec::with_capacity(envelope.observations.len());
        for item in envelope.observations {
            observations.push(item.into_observation()?);
        }
        let series = Series { meta, observations };
        series.check_integrity()?;
        Ok(series)
    }

    async fn releases(&self) -> Result<Vec<ReleaseInfo>, GatewayError> {
        let envelope: ReleasesEnvelope = self.get_json("releases", Vec::new()).await?;
        Ok(envelope.releases.into_iter().map(Into::into).collect())
    }

    async fn release_details(&self, release_id: i64) -> Result<ReleaseInfo, GatewayError> {
        let envelope: ReleasesEnvelope = self
            .get_json(
                "release",
                vec![("release_id".to_string(), release_id.to_string())],
            )
            .await
            .map_err(|e| map_not_found(e, &release_id.to_string()))?;
        envelope
            .releases
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| GatewayError::NotFound {
                series_id: release_id.to_string(),
            })
    }

    async fn category_details(&self, category_id: i64) -> Result<CategoryInfo, GatewayError> {
        let envelope: CategoriesEnvelope = self
            .get_json(
                "category",
                vec![("category_id".to_string(), category_id.to_string())],
            )
            .await
            .map_err(|e| map_not_found(e, &category_id.to_string()))?;
        envelope
            .categories
            .into_iter()
            .next()
            .map(Into::into)
            .ok_or_else(|| GatewayError::NotFound {
                series_id: category_id.to_string(),
            })
    }

    async fn sources(&self) -> Result<Vec<SourceInfo>, GatewayError> {
        let envelope: SourcesEnvelope = self.get_json("sources", Vec::new()).await?;
        Ok(envelope.sources.into_iter().map(Into::into).collect())
    }
}
