use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::scoring::{compute_prediction_points, PredictionInput};

/// Stored result of a league match. Scores are `None` until the match is resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MatchResult {
    pub id: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
}

impl MatchResult {
    pub fn is_resolved(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PredictionRow {
    pub id: i64,
    pub match_id: String,
    pub user_id: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub confident: Option<bool>,
}

impl PredictionRow {
    pub fn against(&self, result: Option<&MatchResult>) -> PredictionInput {
        PredictionInput {
            predicted_home: self.home_score,
            predicted_away: self.away_score,
            actual_home: result.and_then(|r| r.home_score),
            actual_away: result.and_then(|r| r.away_score),
            confident: self.confident.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub score: f64,
}

/// Sums unrounded points per user, highest first. Ties are ordered by user id.
pub fn compute_leaderboard(
    matches: &[MatchResult],
    predictions: &[PredictionRow],
) -> Vec<LeaderboardEntry> {
    let by_id: HashMap<&str, &MatchResult> = matches.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for prediction in predictions {
        let result = by_id.get(prediction.match_id.as_str()).copied();
        let points = compute_prediction_points(&prediction.against(result));
        *totals.entry(prediction.user_id.as_str()).or_insert(0.0) += points;
    }

    let mut leaderboard: Vec<LeaderboardEntry> = totals
        .into_iter()
        .map(|(user_id, score)| LeaderboardEntry {
            user_id: user_id.to_string(),
            score,
        })
        .collect();
    leaderboard.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
    leaderboard
}

/// Points owed to each prediction on a resolved match. Unresolved matches yield nothing.
pub fn recompute_prediction_points(
    result: &MatchResult,
    predictions: &[PredictionRow],
) -> Vec<(i64, f64)> {
    if !result.is_resolved() {
        return Vec::new();
    }
    predictions
        .iter()
        .filter(|p| p.match_id == result.id)
        .map(|p| (p.id, compute_prediction_points(&p.against(Some(result)))))
        .collect()
}
