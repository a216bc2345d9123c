use serde::{Deserialize, Serialize};
use std::env;

use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub sync_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            sync_secret: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiFootballConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub lookback_days: i64,
    pub lookahead_days: i64,
}

impl Default for ApiFootballConfig {
    fn default() -> Self {
        Self {
            base_url: "https://v3.football.api-sports.io".to_string(),
            api_key: None,
            lookback_days: 2,
            lookahead_days: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FootballDataConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for FootballDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.football-data.org/v4".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpConfig {
    pub requests_per_second: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 2,
            request_timeout_secs: 30,
            user_agent: "fixture-sync/0.1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub api_football: ApiFootballConfig,
    pub football_data: FootballDataConfig,
    pub http: HttpConfig,
}

/// First non-empty value among `keys`.
fn first_env(keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| env::var(key).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
}

fn parsed_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.database.url = first_env(&["DATABASE_URL"]);
        if let Some(max) = parsed_env::<u32>("DATABASE_MAX_CONNECTIONS") {
            config.database.max_connections = max;
        }

        if let Some(addr) = first_env(&["SYNC_BIND_ADDR"]) {
            config.server.bind_addr = addr;
        }
        config.server.sync_secret = first_env(&["SYNC_MATCHES_SECRET"]);

        config.api_football.api_key = first_env(&["SPORTS_DATA_API_KEY", "EDGE_SPORTS_DATA_API_KEY"]);
        if let Some(url) = first_env(&["SPORTS_DATA_API_URL"]) {
            config.api_football.base_url = url;
        }
        if let Some(days) = parsed_env::<i64>("SPORTS_DATA_LOOKBACK_DAYS") {
            config.api_football.lookback_days = days;
        }
        if let Some(days) = parsed_env::<i64>("SPORTS_DATA_LOOKAHEAD_DAYS") {
            config.api_football.lookahead_days = days;
        }

        config.football_data.api_key =
            first_env(&["FOOTBALL_DATA_API_KEY", "EDGE_FOOTBALL_DATA_API_KEY"]);
        if let Some(url) = first_env(&["FOOTBALL_DATA_BASE_URL"]) {
            config.football_data.base_url = url;
        }

        if let Some(rps) = parsed_env::<u32>("PROVIDER_RATE_LIMIT_RPS") {
            config.http.requests_per_second = rps;
        }
        if let Some(timeout) = parsed_env::<u64>("PROVIDER_TIMEOUT_SECS") {
            config.http.request_timeout_secs = timeout;
        }
        if let Some(user_agent) = first_env(&["PROVIDER_USER_AGENT"]) {
            config.http.user_agent = user_agent;
        }

        config
    }

    pub fn database_url(&self) -> SyncResult<&str> {
        self.database
            .url
            .as_deref()
            .ok_or_else(|| SyncError::MissingEnv("DATABASE_URL".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.server.bind_addr, "127.0.0.1:3000");
        assert_eq!(config.api_football.lookback_days, 2);
        assert_eq!(config.api_football.lookahead_days, 7);
        assert_eq!(config.football_data.base_url, "https://api.football-data.org/v4");
        assert_eq!(config.http.requests_per_second, 2);
        assert!(config.server.sync_secret.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let config = SyncConfig::default();
        assert!(matches!(config.database_url(), Err(SyncError::MissingEnv(_))));
    }
}
