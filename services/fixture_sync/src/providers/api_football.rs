use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;

use super::{as_string, fallback_id, join_url, non_empty_str, pick_score, ProviderRequest};
use crate::config::ApiFootballConfig;
use crate::error::{SyncError, SyncResult};
use crate::provider_config::ChampionshipProviderConfig;
use crate::sync::SyncOptions;
use crate::time_utils::{format_date, to_iso_string};
use crate::types::{Metadata, ProviderFixture};

/// Fixtures inside the lookback/lookahead window around `now`.
pub fn build_request(
    settings: &ApiFootballConfig,
    config: &ChampionshipProviderConfig,
    now: DateTime<Utc>,
    options: &SyncOptions,
) -> SyncResult<ProviderRequest> {
    let season = options.season_override.or(config.season).filter(|s| *s != 0);
    let (Some(league_id), Some(season)) = (config.league_id, season) else {
        return Err(SyncError::ProviderConfig(
            "api-football config requires leagueId and season".to_string(),
        ));
    };

    let api_key = settings.api_key.clone().ok_or_else(|| {
        SyncError::MissingEnv("SPORTS_DATA_API_KEY, EDGE_SPORTS_DATA_API_KEY".to_string())
    })?;

    let window_bound = |days: i64, forward: bool| {
        TimeDelta::try_days(days)
            .and_then(|delta| {
                if forward {
                    now.checked_add_signed(delta)
                } else {
                    now.checked_sub_signed(delta)
                }
            })
            .ok_or_else(|| {
                SyncError::ProviderConfig(format!("api-football window of {days} days is out of range"))
            })
    };
    let from = window_bound(settings.lookback_days, false)?;
    let to = window_bound(settings.lookahead_days, true)?;

    Ok(ProviderRequest {
        url: join_url(&settings.base_url, "fixtures"),
        query: vec![
            ("league", league_id.to_string()),
            ("season", season.to_string()),
            ("from", format_date(&from)),
            ("to", format_date(&to)),
        ],
        api_key,
    })
}

pub fn parse_fixtures(payload: &Value, now: DateTime<Utc>) -> Vec<ProviderFixture> {
    payload["response"]
        .as_array()
        .map(|entries| entries.iter().map(|entry| parse_entry(entry, now)).collect())
        .unwrap_or_default()
}

fn parse_entry(entry: &Value, now: DateTime<Utc>) -> ProviderFixture {
    let fixture = &entry["fixture"];
    let teams = &entry["teams"];
    let score = &entry["score"];
    let goals = &entry["goals"];

    let side_score = |side: &str| {
        pick_score(&[
            score["fulltime"].get(side),
            score["extratime"].get(side),
            score["penalty"].get(side),
            goals.get(side),
        ])
    };

    let mut metadata = Metadata::new();
    if let Some(long) = non_empty_str(&fixture["status"], "long") {
        metadata.insert("provider_status_long".to_string(), Value::from(long));
    }
    let round = &entry["league"]["round"];
    if !round.is_null() && round.as_str() != Some("") {
        metadata.insert("round".to_string(), round.clone());
    }
    if let Some(venue) = non_empty_str(&fixture["venue"], "name") {
        metadata.insert("venue".to_string(), Value::from(venue));
    }
    if let Some(logo) = non_empty_str(&teams["home"], "logo") {
        metadata.insert("homeCrest".to_string(), Value::from(logo));
    }
    if let Some(logo) = non_empty_str(&teams["away"], "logo") {
        metadata.insert("awayCrest".to_string(), Value::from(logo));
    }

    ProviderFixture {
        id: as_string(fixture.get("id"))
            .or_else(|| as_string(entry.get("id")))
            .unwrap_or_else(fallback_id),
        home_team: teams["home"]["name"].as_str().unwrap_or("Home").to_string(),
        away_team: teams["away"]["name"].as_str().unwrap_or("Away").to_string(),
        start_time: fixture["date"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| to_iso_string(&now)),
        status: fixture["status"]["short"]
            .as_str()
            .or_else(|| fixture["status"]["long"].as_str())
            .map(str::to_string),
        home_score: side_score("home"),
        away_score: side_score("away"),
        metadata: Some(metadata),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawScore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn settings() -> ApiFootballConfig {
        ApiFootballConfig {
            api_key: Some("secret".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_request_window() {
        let request = build_request(
            &settings(),
            &ChampionshipProviderConfig::api_football(140, 2025),
            now(),
            &SyncOptions::default(),
        )
        .unwrap();

        assert_eq!(request.url, "https://v3.football.api-sports.io/fixtures");
        assert_eq!(
            request.query,
            vec![
                ("league", "140".to_string()),
                ("season", "2025".to_string()),
                ("from", "2025-03-08".to_string()),
                ("to", "2025-03-17".to_string()),
            ]
        );
        assert_eq!(request.api_key, "secret");
    }

    #[test]
    fn test_season_override_wins() {
        let options = SyncOptions {
            season_override: Some(2024),
        };
        let request = build_request(
            &settings(),
            &ChampionshipProviderConfig::api_football(135, 2025),
            now(),
            &options,
        )
        .unwrap();
        assert_eq!(request.query[1], ("season", "2024".to_string()));
    }

    #[test]
    fn test_build_request_requires_league_and_key() {
        let mut config = ChampionshipProviderConfig::api_football(140, 2025);
        config.league_id = None;
        let err = build_request(&settings(), &config, now(), &SyncOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::ProviderConfig(_)));

        let err = build_request(
            &ApiFootballConfig::default(),
            &ChampionshipProviderConfig::api_football(140, 2025),
            now(),
            &SyncOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::MissingEnv(_)));
    }

    #[test]
    fn test_oversized_window_is_a_config_error() {
        let settings = ApiFootballConfig {
            lookback_days: 100_000_000,
            ..self::settings()
        };
        let err = build_request(
            &settings,
            &ChampionshipProviderConfig::api_football(140, 2025),
            now(),
            &SyncOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::ProviderConfig(_)));

        let settings = ApiFootballConfig {
            lookahead_days: i64::MAX,
            ..self::settings()
        };
        let err = build_request(
            &settings,
            &ChampionshipProviderConfig::api_football(140, 2025),
            now(),
            &SyncOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::ProviderConfig(_)));
    }

    #[test]
    fn test_parse_fixtures() {
        let payload = json!({
            "response": [
                {
                    "fixture": {
                        "id": 1208021,
                        "date": "2025-03-09T20:00:00+00:00",
                        "status": { "short": "FT", "long": "Match Finished" },
                        "venue": { "name": "Estadio de la Ceramica" }
                    },
                    "league": { "round": "Regular Season - 27" },
                    "teams": {
                        "home": { "name": "Villarreal", "logo": "https://media.api-sports.io/football/teams/533.png" },
                        "away": { "name": "Espanyol" }
                    },
                    "goals": { "home": 1, "away": 2 },
                    "score": { "fulltime": { "home": 1, "away": 2 }, "extratime": { "home": null, "away": null } }
                },
                {
                    "fixture": { "id": 1208030, "status": { "long": "Not Started" } },
                    "teams": {},
                    "goals": { "home": null, "away": null },
                    "score": {}
                }
            ]
        });

        let fixtures = parse_fixtures(&payload, now());
        assert_eq!(fixtures.len(), 2);

        let first = &fixtures[0];
        assert_eq!(first.id, "1208021");
        assert_eq!(first.home_team, "Villarreal");
        assert_eq!(first.status.as_deref(), Some("FT"));
        assert_eq!(first.home_score, Some(RawScore::Number(1.0)));
        assert_eq!(first.away_score, Some(RawScore::Number(2.0)));
        let meta = first.metadata.as_ref().unwrap();
        assert_eq!(meta["provider_status_long"], json!("Match Finished"));
        assert_eq!(meta["round"], json!("Regular Season - 27"));
        assert_eq!(meta["venue"], json!("Estadio de la Ceramica"));
        assert_eq!(meta["homeCrest"], json!("https://media.api-sports.io/football/teams/533.png"));
        assert!(meta.get("awayCrest").is_none());

        let second = &fixtures[1];
        assert_eq!(second.home_team, "Home");
        assert_eq!(second.away_team, "Away");
        assert_eq!(second.start_time, "2025-03-10T12:00:00.000Z");
        assert_eq!(second.status.as_deref(), Some("Not Started"));
        assert_eq!(second.home_score, None);
    }

    #[test]
    fn test_parse_fixtures_without_response() {
        assert!(parse_fixtures(&json!({ "errors": ["rate limit"] }), now()).is_empty());
    }
}
