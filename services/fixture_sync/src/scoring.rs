use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Point values for a prediction. The defaults are the product's current rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub exact_score_points: f64,
    pub outcome_points: f64,
    pub confidence_multiplier: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            exact_score_points: 6.0,
            outcome_points: 3.0,
            confidence_multiplier: 1.1,
        }
    }
}

/// A predicted scoreline next to the actual one. `None` means not submitted / not played yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub predicted_home: Option<i32>,
    pub predicted_away: Option<i32>,
    pub actual_home: Option<i32>,
    pub actual_away: Option<i32>,
    #[serde(default)]
    pub confident: bool,
}

fn outcome(home: i32, away: i32) -> Ordering {
    home.cmp(&away)
}

pub fn compute_prediction_points(input: &PredictionInput) -> f64 {
    compute_prediction_points_with(input, &ScoringRules::default())
}

pub fn compute_prediction_points_with(input: &PredictionInput, rules: &ScoringRules) -> f64 {
    let (Some(pred_home), Some(pred_away), Some(actual_home), Some(actual_away)) = (
        input.predicted_home,
        input.predicted_away,
        input.actual_home,
        input.actual_away,
    ) else {
        return 0.0;
    };

    let mut points = if pred_home == actual_home && pred_away == actual_away {
        rules.exact_score_points
    } else if outcome(pred_home, pred_away) == outcome(actual_home, actual_away) {
        rules.outcome_points
    } else {
        0.0
    };

    if input.confident && points > 0.0 {
        points *= rules.confidence_multiplier;
    }

    points
}

/// Display/storage rounding to two decimals. Aggregates should sum the unrounded value.
pub fn compute_prediction_points_rounded(input: &PredictionInput) -> f64 {
    round_to_cents(compute_prediction_points(input))
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(pred: (i32, i32), actual: (i32, i32), confident: bool) -> PredictionInput {
        PredictionInput {
            predicted_home: Some(pred.0),
            predicted_away: Some(pred.1),
            actual_home: Some(actual.0),
            actual_away: Some(actual.1),
            confident,
        }
    }

    #[test]
    fn test_missing_scores_give_zero() {
        let mut prediction = input((1, 1), (2, 0), true);
        prediction.predicted_home = None;
        assert_eq!(compute_prediction_points(&prediction), 0.0);

        let unresolved = PredictionInput {
            predicted_home: Some(2),
            predicted_away: Some(0),
            confident: true,
            ..Default::default()
        };
        assert_eq!(compute_prediction_points(&unresolved), 0.0);
    }

    #[test]
    fn test_exact_score() {
        assert_eq!(compute_prediction_points(&input((2, 1), (2, 1), false)), 6.0);
        assert_eq!(compute_prediction_points(&input((0, 0), (0, 0), false)), 6.0);
        assert_eq!(compute_prediction_points_rounded(&input((2, 1), (2, 1), true)), 6.6);
    }

    #[test]
    fn test_correct_outcome() {
        assert_eq!(compute_prediction_points(&input((3, 1), (2, 0), false)), 3.0);
        assert_eq!(compute_prediction_points(&input((3, 1), (2, 1), false)), 3.0);
        assert_eq!(compute_prediction_points(&input((1, 1), (2, 2), false)), 3.0);
        assert_eq!(compute_prediction_points(&input((0, 2), (1, 3), false)), 3.0);
    }

    #[test]
    fn test_wrong_outcome() {
        assert_eq!(compute_prediction_points(&input((0, 2), (1, 0), false)), 0.0);
        assert_eq!(compute_prediction_points(&input((1, 1), (1, 0), true)), 0.0);
    }

    #[test]
    fn test_confidence_multiplier() {
        let points = compute_prediction_points(&input((2, 0), (1, 0), true));
        assert!((points - 3.3).abs() < 1e-9);
        assert_eq!(compute_prediction_points_rounded(&input((2, 0), (1, 0), true)), 3.3);
    }

    #[test]
    fn test_custom_rules() {
        let rules = ScoringRules {
            exact_score_points: 10.0,
            outcome_points: 4.0,
            confidence_multiplier: 2.0,
        };
        assert_eq!(compute_prediction_points_with(&input((1, 0), (1, 0), true), &rules), 20.0);
        assert_eq!(compute_prediction_points_with(&input((2, 0), (1, 0), false), &rules), 4.0);
    }
}
