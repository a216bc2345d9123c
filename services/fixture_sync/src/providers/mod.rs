pub mod api_football;
pub mod football_data;
pub mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use nonzero_ext::nonzero;
use serde_json::Value;
use std::{num::NonZeroU32, sync::Arc, time::Duration, time::Instant};
use tracing::{debug, warn};

use crate::config::{ApiFootballConfig, FootballDataConfig, SyncConfig};
use crate::error::{SyncError, SyncResult};
use crate::metrics::MetricsCollector;
use crate::provider_config::{ChampionshipProviderConfig, ProviderDriver};
use crate::sync::SyncOptions;
use crate::types::{ProviderFixture, RawScore};

/// Anything that can hand back the raw fixtures for one league.
#[async_trait]
pub trait FixtureSource: Send + Sync {
    async fn fetch_fixtures(
        &self,
        league_id: &str,
        config: &ChampionshipProviderConfig,
        now: DateTime<Utc>,
        options: &SyncOptions,
    ) -> SyncResult<Vec<ProviderFixture>>;
}

/// Talks to the real provider APIs, rate limited across all providers.
pub struct HttpFixtureSource {
    client: reqwest::Client,
    rate_limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    metrics: MetricsCollector,
    api_football: ApiFootballConfig,
    football_data: FootballDataConfig,
}

impl HttpFixtureSource {
    pub fn new(config: &SyncConfig, metrics: MetricsCollector) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.request_timeout_secs))
            .build()?;

        let per_second = NonZeroU32::new(config.http.requests_per_second).unwrap_or(nonzero!(1u32));
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

        Ok(Self {
            client,
            rate_limiter,
            metrics,
            api_football: config.api_football.clone(),
            football_data: config.football_data.clone(),
        })
    }

    async fn get_json(
        &self,
        provider: ProviderDriver,
        url: &str,
        query: &[(&str, String)],
        headers: &[(&str, &str)],
    ) -> SyncResult<Value> {
        let wait_start = Instant::now();
        self.rate_limiter.until_ready().await;
        self.metrics.record_rate_limit_wait(wait_start.elapsed());

        debug!(%provider, url, "Requesting fixtures");
        let tracker = self.metrics.record_request_start();

        let mut request = self
            .client
            .get(url)
            .query(query)
            .header("accept", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracker.finish(false);
                self.metrics.record_error(e.to_string());
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracker.finish(false);
            let body = response.text().await.unwrap_or_default();
            let error = SyncError::ProviderStatus {
                provider: provider.to_string(),
                status: status.as_u16(),
                body,
            };
            warn!(%provider, status = status.as_u16(), "Provider returned an error status");
            self.metrics.record_error(error.to_string());
            return Err(error);
        }

        match response.json::<Value>().await {
            Ok(payload) => {
                tracker.finish(true);
                Ok(payload)
            }
            Err(e) => {
                tracker.finish(false);
                warn!(%provider, "Provider returned an unreadable body");
                self.metrics.record_error(e.to_string());
                Err(e.into())
            }
        }
    }
}

#[async_trait]
impl FixtureSource for HttpFixtureSource {
    async fn fetch_fixtures(
        &self,
        league_id: &str,
        config: &ChampionshipProviderConfig,
        now: DateTime<Utc>,
        options: &SyncOptions,
    ) -> SyncResult<Vec<ProviderFixture>> {
        match config.provider {
            ProviderDriver::Mock => Ok(mock::mock_fixtures(league_id, now)),
            ProviderDriver::ApiFootball => {
                let request = api_football::build_request(&self.api_football, config, now, options)?;
                let headers = [("x-apisports-key", request.api_key.as_str())];
                let payload = self
                    .get_json(config.provider, &request.url, &request.query, &headers)
                    .await?;
                Ok(api_football::parse_fixtures(&payload, now))
            }
            ProviderDriver::FootballData => {
                let request = football_data::build_request(&self.football_data, config, options)?;
                let headers = [("X-Auth-Token", request.api_key.as_str())];
                let payload = self
                    .get_json(config.provider, &request.url, &request.query, &headers)
                    .await?;
                Ok(football_data::parse_fixtures(&payload, now))
            }
        }
    }
}

/// Prepared provider call: endpoint, query string and credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub api_key: String,
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// First of `candidates` that is present and not JSON null, as a raw score.
pub(crate) fn pick_score(candidates: &[Option<&Value>]) -> Option<RawScore> {
    let value: &Value = candidates
        .iter()
        .flatten()
        .copied()
        .find(|value| !value.is_null())?;
    Some(match value {
        Value::Number(n) => RawScore::Number(n.as_f64()?),
        Value::String(s) => RawScore::Text(s.clone()),
        other => RawScore::Other(other.clone()),
    })
}

pub(crate) fn as_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-empty string at `key`, for metadata fields that only count when set.
pub(crate) fn non_empty_str<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

pub(crate) fn fallback_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
