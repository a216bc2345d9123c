use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::parse_timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartCondition {
    #[default]
    Date,
    Participants,
    /// Any other label. Gated like `Date`.
    #[serde(other)]
    Other,
}

/// Read-only projection of the league fields that gate the competitive phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartableLeague {
    #[serde(default)]
    pub start_condition: Option<StartCondition>,
    #[serde(default)]
    pub start_min_participants: Option<i64>,
    #[serde(default)]
    pub start_at: Option<String>,
    #[serde(default)]
    pub signup_deadline: Option<String>,
    #[serde(default)]
    pub participants: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Whether the league has begun as of `now`. A missing league counts as started.
pub fn has_league_started(league: Option<&StartableLeague>, now: DateTime<Utc>) -> bool {
    let Some(league) = league else {
        return true;
    };

    if matches!(league.status.as_deref(), Some("active") | Some("completed")) {
        return true;
    }

    match league.start_condition.unwrap_or_default() {
        StartCondition::Participants => {
            let current = league.participants.unwrap_or(0);
            league
                .start_min_participants
                .is_some_and(|min| current >= min)
        }
        StartCondition::Date | StartCondition::Other => {
            let trigger = league
                .start_at
                .as_deref()
                .or(league.signup_deadline.as_deref())
                .unwrap_or_default();
            if trigger.is_empty() {
                return true;
            }
            // an unreadable trigger never opens the gate
            parse_timestamp(trigger).is_some_and(|instant| instant <= now)
        }
    }
}
