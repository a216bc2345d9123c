use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderDriver {
    ApiFootball,
    FootballData,
    Mock,
}

impl ProviderDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderDriver::ApiFootball => "api-football",
            ProviderDriver::FootballData => "football-data",
            ProviderDriver::Mock => "mock",
        }
    }
}

impl fmt::Display for ProviderDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChampionshipProviderConfig {
    pub provider: ProviderDriver,
    pub league_id: Option<u32>,
    pub competition_code: Option<String>,
    pub season: Option<i32>,
    pub timezone: Option<String>,
    /// Per-championship token. Falls back to the provider's env key when blank.
    pub api_token: Option<String>,
}

impl ChampionshipProviderConfig {
    pub fn mock() -> Self {
        Self {
            provider: ProviderDriver::Mock,
            league_id: None,
            competition_code: None,
            season: None,
            timezone: None,
            api_token: None,
        }
    }

    pub fn api_football(league_id: u32, season: i32) -> Self {
        Self {
            provider: ProviderDriver::ApiFootball,
            league_id: Some(league_id),
            season: Some(season),
            ..Self::mock()
        }
    }

    pub fn football_data(competition_code: &str, season: i32) -> Self {
        Self {
            provider: ProviderDriver::FootballData,
            competition_code: Some(competition_code.to_string()),
            season: Some(season),
            ..Self::mock()
        }
    }
}

/// Championship slug to provider mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    championships: HashMap<String, ChampionshipProviderConfig>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, championship: &str, config: ChampionshipProviderConfig) -> Self {
        self.championships.insert(championship.to_string(), config);
        self
    }

    pub fn get(&self, championship: &str) -> Option<&ChampionshipProviderConfig> {
        self.championships.get(championship)
    }

    pub fn len(&self) -> usize {
        self.championships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.championships.is_empty()
    }
}

pub fn default_registry() -> ProviderRegistry {
    ProviderRegistry::new()
        .with("premier-league", ChampionshipProviderConfig::football_data("PL", 2025))
        .with("champions-league", ChampionshipProviderConfig::football_data("CL", 2025))
        .with("la-liga", ChampionshipProviderConfig::api_football(140, 2025))
        .with("serie-a", ChampionshipProviderConfig::api_football(135, 2025))
        .with("bundesliga", ChampionshipProviderConfig::football_data("BL1", 2025))
        .with("ligue-1", ChampionshipProviderConfig::football_data("FL1", 2025))
        .with("nba", ChampionshipProviderConfig::mock())
        .with("nfl", ChampionshipProviderConfig::mock())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry() {
        let registry = default_registry();
        assert_eq!(registry.len(), 8);

        let pl = registry.get("premier-league").unwrap();
        assert_eq!(pl.provider, ProviderDriver::FootballData);
        assert_eq!(pl.competition_code.as_deref(), Some("PL"));

        let liga = registry.get("la-liga").unwrap();
        assert_eq!(liga.provider, ProviderDriver::ApiFootball);
        assert_eq!(liga.league_id, Some(140));

        assert!(registry.get("curling").is_none());
    }

    #[test]
    fn test_driver_names() {
        assert_eq!(ProviderDriver::ApiFootball.to_string(), "api-football");
        assert_eq!(
            serde_json::to_string(&ProviderDriver::FootballData).unwrap(),
            "\"football-data\""
        );
    }
}
