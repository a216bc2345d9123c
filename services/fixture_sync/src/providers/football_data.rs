use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{as_string, fallback_id, join_url, non_empty_str, pick_score, ProviderRequest};
use crate::config::FootballDataConfig;
use crate::error::{SyncError, SyncResult};
use crate::provider_config::ChampionshipProviderConfig;
use crate::sync::SyncOptions;
use crate::time_utils::to_iso_string;
use crate::types::{Metadata, ProviderFixture};

pub fn build_request(
    settings: &FootballDataConfig,
    config: &ChampionshipProviderConfig,
    options: &SyncOptions,
) -> SyncResult<ProviderRequest> {
    let code = config
        .competition_code
        .as_deref()
        .filter(|code| !code.is_empty())
        .ok_or_else(|| {
            SyncError::ProviderConfig("football-data config requires competitionCode".to_string())
        })?;

    let api_key = config
        .api_token
        .as_deref()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| settings.api_key.clone())
        .ok_or_else(|| {
            SyncError::MissingEnv("FOOTBALL_DATA_API_KEY, EDGE_FOOTBALL_DATA_API_KEY".to_string())
        })?;

    let mut query = Vec::new();
    if let Some(season) = options.season_override.or(config.season).filter(|s| *s != 0) {
        query.push(("season", season.to_string()));
    }

    Ok(ProviderRequest {
        url: join_url(&settings.base_url, &format!("competitions/{code}/matches")),
        query,
        api_key,
    })
}

/// Copies `from[key]` into `meta[as_key]` when it is set (not null, not an empty string).
fn copy_field(meta: &mut Metadata, as_key: &str, from: &Value, key: &str) {
    let value = &from[key];
    if value.is_null() || value.as_str() == Some("") {
        return;
    }
    meta.insert(as_key.to_string(), value.clone());
}

fn referees(list: &Value) -> Option<Value> {
    let refs = list.as_array().filter(|refs| !refs.is_empty())?;
    Some(Value::Array(
        refs.iter()
            .map(|referee| {
                json!({
                    "id": referee["id"],
                    "name": referee["name"],
                    "type": referee["type"],
                    "nationality": referee["nationality"],
                })
            })
            .collect(),
    ))
}

pub fn parse_fixtures(payload: &Value, now: DateTime<Utc>) -> Vec<ProviderFixture> {
    let Some(matches) = payload["matches"].as_array() else {
        return Vec::new();
    };
    matches
        .iter()
        .map(|entry| parse_match(entry, payload, now))
        .collect()
}

fn parse_match(entry: &Value, payload: &Value, now: DateTime<Utc>) -> ProviderFixture {
    let score = &entry["score"];
    let competition = if entry["competition"].is_object() {
        &entry["competition"]
    } else {
        &payload["competition"]
    };
    let filters = &payload["filters"];
    let result_set = &payload["resultSet"];
    let season = &entry["season"];

    let mut meta = Metadata::new();
    copy_field(&mut meta, "matchday", entry, "matchday");
    copy_field(&mut meta, "stage", entry, "stage");
    copy_field(&mut meta, "group", entry, "group");
    copy_field(&mut meta, "lastUpdated", entry, "lastUpdated");
    copy_field(&mut meta, "competitionCode", competition, "code");
    copy_field(&mut meta, "competitionName", competition, "name");
    copy_field(&mut meta, "seasonStart", season, "startDate");
    copy_field(&mut meta, "seasonEnd", season, "endDate");
    copy_field(&mut meta, "currentMatchday", season, "currentMatchday");
    copy_field(&mut meta, "filterSeason", filters, "season");
    copy_field(&mut meta, "filterMatchday", filters, "matchday");
    copy_field(&mut meta, "rangeStart", result_set, "first");
    copy_field(&mut meta, "rangeEnd", result_set, "last");
    copy_field(&mut meta, "rangeCount", result_set, "count");
    copy_field(&mut meta, "area", &entry["area"], "name");
    copy_field(&mut meta, "oddsMessage", &entry["odds"], "msg");
    if let Some(refs) = referees(&entry["referees"]) {
        meta.insert("referees".to_string(), refs);
    }
    if let Some(crest) = non_empty_str(&entry["homeTeam"], "crest") {
        meta.insert("homeCrest".to_string(), Value::from(crest));
    }
    if let Some(crest) = non_empty_str(&entry["awayTeam"], "crest") {
        meta.insert("awayCrest".to_string(), Value::from(crest));
    }

    let side_score = |side: &str| {
        pick_score(&[
            score["fullTime"].get(side),
            score["extraTime"].get(side),
            score["penalties"].get(side),
        ])
    };
    let team_name = |team: &Value, fallback: &str| {
        team["name"]
            .as_str()
            .or_else(|| team["shortName"].as_str())
            .unwrap_or(fallback)
            .to_string()
    };

    ProviderFixture {
        id: as_string(entry.get("id")).unwrap_or_else(fallback_id),
        home_team: team_name(&entry["homeTeam"], "Home"),
        away_team: team_name(&entry["awayTeam"], "Away"),
        start_time: entry["utcDate"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| to_iso_string(&now)),
        status: entry["status"].as_str().map(str::to_string),
        home_score: side_score("home"),
        away_score: side_score("away"),
        metadata: Some(meta),
    }
}
