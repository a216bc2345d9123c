use chrono::{DateTime, Duration, Utc};

use crate::time_utils::to_iso_string;
use crate::types::ProviderFixture;

const MOCK_TEAMS: &[(&str, &str)] = &[
    ("Demo FC", "Sample United"),
    ("Placeholder Town", "Fallback City"),
];

/// Two upcoming demo fixtures, one and two days after `now`.
pub fn mock_fixtures(league_id: &str, now: DateTime<Utc>) -> Vec<ProviderFixture> {
    MOCK_TEAMS
        .iter()
        .zip(1i64..)
        .map(|((home, away), day)| ProviderFixture {
            id: format!("{league_id}-mock-{day}"),
            home_team: home.to_string(),
            away_team: away.to_string(),
            start_time: to_iso_string(&(now + Duration::days(day))),
            status: Some("NS".to_string()),
            home_score: None,
            away_score: None,
            metadata: None,
        })
        .collect()
}
