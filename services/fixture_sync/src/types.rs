use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time_utils::{iso_millis, to_iso_string};

/// Opaque provider metadata. Key order is preserved as received.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

pub const HOME_CREST_KEY: &str = "homeCrest";
pub const AWAY_CREST_KEY: &str = "awayCrest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Upcoming,
    Live,
    Completed,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Upcoming => "upcoming",
            MatchStatus::Live => "live",
            MatchStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score as a provider sent it: a number, a numeric string, or something unusable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScore {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl From<i32> for RawScore {
    fn from(value: i32) -> Self {
        RawScore::Number(f64::from(value))
    }
}

impl From<f64> for RawScore {
    fn from(value: f64) -> Self {
        RawScore::Number(value)
    }
}

impl From<&str> for RawScore {
    fn from(value: &str) -> Self {
        RawScore::Text(value.to_string())
    }
}

/// Fixture record as returned by a provider adapter. Nothing in here is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderFixture {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub start_time: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub home_score: Option<RawScore>,
    #[serde(default)]
    pub away_score: Option<RawScore>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFixture {
    pub external_ref: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(with = "iso_millis")]
    pub start_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    pub raw_status: Option<String>,
    pub provider_meta: Option<Metadata>,
}

impl NormalizedFixture {
    pub fn start_at_iso(&self) -> String {
        to_iso_string(&self.start_at)
    }
}

/// Stored row as read before a sync pass. Only ever compared, never written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingMatchSnapshot {
    pub start_at: String,
    pub status: Option<String>,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchUpsertPayload {
    pub league_id: String,
    pub home_team: String,
    pub away_team: String,
    #[serde(with = "iso_millis")]
    pub start_at: DateTime<Utc>,
    pub status: MatchStatus,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    pub external_ref: String,
    pub metadata: Metadata,
}
