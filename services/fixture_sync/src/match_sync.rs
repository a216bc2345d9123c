use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;

use crate::time_utils::{coerce_timestamp, parse_timestamp};
use crate::types::{
    ExistingMatchSnapshot, MatchStatus, MatchUpsertPayload, Metadata, NormalizedFixture,
    ProviderFixture, RawScore, AWAY_CREST_KEY, HOME_CREST_KEY,
};

const COMPLETED_MARKERS: &[&str] = &[
    "ft",
    "full_time",
    "ended",
    "finished",
    "completed",
    "match_finished",
    "after_pens",
    "pen",
    "aet",
    "final",
    "finalized",
    "terminated",
];

const LIVE_MARKERS: &[&str] = &[
    "live",
    "in_play",
    "inprogress",
    "1h",
    "2h",
    "ht",
    "et",
    "p",
    "pause",
    "paused",
    "halftime",
    "second_half",
    "first_half",
    "extra_time",
    "suspended",
];

const UPCOMING_MARKERS: &[&str] = &[
    "ns",
    "not_started",
    "scheduled",
    "timed",
    "tbd",
    "to_be_defined",
    "postponed",
    "delayed",
    "cancelled",
    "canceled",
];

fn is_marker(markers: &[&str], status: &str) -> bool {
    markers.contains(&status)
}

/// Coerces a provider score into a number.
///
/// Numeric strings are accepted. Only values that are not finite are dropped.
pub fn coerce_score(raw: Option<&RawScore>) -> Option<f64> {
    let value = match raw? {
        RawScore::Number(n) => *n,
        RawScore::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            text.parse::<f64>().ok()?
        }
        RawScore::Other(_) => return None,
    };

    value.is_finite().then_some(value)
}

/// Infers the canonical status of a fixture.
///
/// Precedence, first match wins:
/// 1. a completed marker
/// 2. both scores present and the label is absent or not an upcoming marker
/// 3. a live marker
/// 4. kickoff at or before `now` with no label, or a label that is not an upcoming
///    marker: completed if both scores are present, live otherwise
/// 5. upcoming
pub fn map_provider_status(
    provider_status: Option<&str>,
    start_at: DateTime<Utc>,
    home_score: Option<f64>,
    away_score: Option<f64>,
    now: DateTime<Utc>,
) -> MatchStatus {
    let normalized = provider_status.map(|s| s.trim().to_lowercase());
    let normalized = normalized.as_deref();
    let has_final_score = home_score.is_some() && away_score.is_some();

    if normalized.is_some_and(|s| is_marker(COMPLETED_MARKERS, s)) {
        return MatchStatus::Completed;
    }

    let not_upcoming_label = normalized.map_or(true, |s| !is_marker(UPCOMING_MARKERS, s));

    if has_final_score && not_upcoming_label {
        return MatchStatus::Completed;
    }

    if normalized.is_some_and(|s| is_marker(LIVE_MARKERS, s)) {
        return MatchStatus::Live;
    }

    if start_at <= now && not_upcoming_label {
        return if has_final_score {
            MatchStatus::Completed
        } else {
            MatchStatus::Live
        };
    }

    MatchStatus::Upcoming
}

/// Maps a provider fixture into the canonical shape.
///
/// An unreadable start time is replaced with `reference`, which is also the "now"
/// used for status inference.
pub fn normalize_fixture(fixture: &ProviderFixture, reference: DateTime<Utc>) -> NormalizedFixture {
    let home_score = coerce_score(fixture.home_score.as_ref());
    let away_score = coerce_score(fixture.away_score.as_ref());
    let start_at = coerce_timestamp(&fixture.start_time, reference).trunc_subsecs(3);
    let status = map_provider_status(
        fixture.status.as_deref(),
        start_at,
        home_score,
        away_score,
        reference,
    );

    NormalizedFixture {
        external_ref: fixture.id.clone(),
        home_team: fixture.home_team.clone(),
        away_team: fixture.away_team.clone(),
        start_at,
        status,
        home_score,
        away_score,
        raw_status: fixture.status.clone(),
        provider_meta: fixture.metadata.clone(),
    }
}

fn extract_crest<'a>(metadata: Option<&'a Metadata>, key: &str) -> &'a str {
    metadata
        .and_then(|meta| meta.get(key))
        .and_then(Value::as_str)
        .unwrap_or("")
}

fn existing_metadata(existing: &ExistingMatchSnapshot) -> Option<&Metadata> {
    existing.metadata.as_ref().and_then(Value::as_object)
}

/// Decides whether a stored row needs rewriting for `normalized`.
///
/// Only start time, status, scores and the two crest URLs take part. Other metadata
/// keys churn between provider calls and are ignored.
pub fn has_match_changed(
    existing: Option<&ExistingMatchSnapshot>,
    normalized: &NormalizedFixture,
) -> bool {
    let Some(existing) = existing else {
        return true;
    };

    let existing_start = parse_timestamp(&existing.start_at).map(|dt| dt.trunc_subsecs(3));
    let existing_status = existing.status.as_deref().unwrap_or(MatchStatus::Upcoming.as_str());
    let existing_meta = existing_metadata(existing);
    let normalized_meta = normalized.provider_meta.as_ref();

    existing_start != Some(normalized.start_at)
        || existing_status != normalized.status.as_str()
        || existing.home_score != normalized.home_score
        || existing.away_score != normalized.away_score
        || extract_crest(existing_meta, HOME_CREST_KEY) != extract_crest(normalized_meta, HOME_CREST_KEY)
        || extract_crest(existing_meta, AWAY_CREST_KEY) != extract_crest(normalized_meta, AWAY_CREST_KEY)
}

pub fn build_upsert_payload(
    league_id: &str,
    normalized: &NormalizedFixture,
    provider: &str,
) -> MatchUpsertPayload {
    let mut metadata = Metadata::new();
    metadata.insert("provider".to_string(), Value::from(provider));
    metadata.insert(
        "provider_status".to_string(),
        normalized
            .raw_status
            .as_deref()
            .map_or(Value::Null, Value::from),
    );
    if let Some(meta) = &normalized.provider_meta {
        for (key, value) in meta {
            metadata.insert(key.clone(), value.clone());
        }
    }

    MatchUpsertPayload {
        league_id: league_id.to_string(),
        home_team: normalized.home_team.clone(),
        away_team: normalized.away_team.clone(),
        start_at: normalized.start_at,
        status: normalized.status,
        home_score: normalized.home_score,
        away_score: normalized.away_score,
        external_ref: normalized.external_ref.clone(),
        metadata,
    }
}
