use crate::{config::AppConfig, traffic::MetricFamily};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// One daily record as the traffic API reports it. Non-UTC offsets in the
/// payload are converted to UTC during deserialization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTrafficRecord {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
    pub uniques: u64,
}

// The API wraps each list in an envelope keyed by the metric name, alongside
// aggregate totals we don't use. A missing list reads as empty.
#[derive(Debug, Deserialize)]
struct ViewsResponse {
    #[serde(default)]
    views: Vec<RawTrafficRecord>,
}

#[derive(Debug, Deserialize)]
struct ClonesResponse {
    #[serde(default)]
    clones: Vec<RawTrafficRecord>,
}

/// A failed fetch for one metric family. The pipeline degrades that family to
/// an empty table and keeps going; the run's exit status still reflects it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{family} endpoint returned {status}: {body}")]
    Status {
        family: MetricFamily,
        status: StatusCode,
        body: String,
    },
    #[error("failed to decode {family} payload: {source}")]
    Malformed {
        family: MetricFamily,
        source: reqwest::Error,
    },
    #[error("{family} request failed: {source}")]
    Transport {
        family: MetricFamily,
        source: reqwest::Error,
    },
}

pub struct TrafficClient {
    client: Client,
    base_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl TrafficClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("git-traffik/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.github.request_timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            base_url: config.github.api_base_url.trim_end_matches('/').to_string(),
            owner: config.github.owner.clone(),
            repo: config.github.repo.clone(),
            token: config.github.token.clone(),
        })
    }

    pub async fn fetch(&self, family: MetricFamily) -> Result<Vec<RawTrafficRecord>, FetchError> {
        let url = format!(
            "{}/repos/{}/{}/traffic/{}",
            self.base_url,
            self.owner,
            self.repo,
            family.endpoint()
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| FetchError::Transport { family, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                family,
                status,
                body,
            });
        }

        let records = match family {
            MetricFamily::Views => {
                response
                    .json::<ViewsResponse>()
                    .await
                    .map_err(|source| FetchError::Malformed { family, source })?
                    .views
            }
            MetricFamily::Clones => {
                response
                    .json::<ClonesResponse>()
                    .await
                    .map_err(|source| FetchError::Malformed { family, source })?
                    .clones
            }
        };

        Ok(records)
    }
}
