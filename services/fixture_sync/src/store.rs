use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};

use crate::error::{SyncError, SyncResult};
use crate::leaderboard::{MatchResult, PredictionRow};
use crate::time_utils::to_iso_string;
use crate::types::{ExistingMatchSnapshot, MatchUpsertPayload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeagueRow {
    pub id: String,
    pub name: String,
    pub championship: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeagueMatchRow {
    pub id: String,
    pub external_ref: Option<String>,
    pub start_at: DateTime<Utc>,
    pub status: Option<String>,
    pub home_score: Option<f64>,
    pub away_score: Option<f64>,
    pub metadata: Option<serde_json::Value>,
}

impl LeagueMatchRow {
    pub fn snapshot(&self) -> ExistingMatchSnapshot {
        ExistingMatchSnapshot {
            start_at: to_iso_string(&self.start_at),
            status: self.status.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            metadata: self.metadata.clone(),
        }
    }
}

/// Reads and writes the orchestrator needs from the league store.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Leagues with a championship set, limited to `ids` when any are given.
    async fn fetch_leagues(&self, ids: &[String]) -> SyncResult<Vec<LeagueRow>>;

    async fn fetch_league_matches(&self, league_id: &str) -> SyncResult<Vec<LeagueMatchRow>>;

    /// Inserts all rows in one round-trip.
    async fn insert_matches(&self, payloads: &[MatchUpsertPayload]) -> SyncResult<()>;

    /// Rewrites the mutable fields of one row. Team names and league stay as stored.
    async fn update_match(&self, match_id: &str, payload: &MatchUpsertPayload) -> SyncResult<()>;

    async fn evaluate_league_completion(&self, league_id: &str) -> SyncResult<()>;
}

/// Prediction reads and point writes used by the leaderboard tooling.
#[async_trait]
pub trait PredictionStore: Send + Sync {
    async fn fetch_league_ids(&self) -> SyncResult<Vec<String>>;

    async fn fetch_league_results(&self, league_id: &str) -> SyncResult<Vec<MatchResult>>;

    async fn fetch_league_predictions(&self, league_id: &str) -> SyncResult<Vec<PredictionRow>>;

    async fn update_prediction_points(&self, prediction_id: i64, points: f64) -> SyncResult<()>;
}

#[derive(Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> SyncResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        info!(max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MatchStore for PgMatchStore {
    async fn fetch_leagues(&self, ids: &[String]) -> SyncResult<Vec<LeagueRow>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT id::text AS id, name, championship, status
            FROM leagues
            WHERE championship IS NOT NULL
            "#,
        );
        if !ids.is_empty() {
            query.push(" AND id::text = ANY(").push_bind(ids.to_vec()).push(")");
        }

        query
            .build_query_as::<LeagueRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(SyncError::store("Failed to fetch leagues"))
    }

    async fn fetch_league_matches(&self, league_id: &str) -> SyncResult<Vec<LeagueMatchRow>> {
        let rows = sqlx::query_as::<_, LeagueMatchRow>(
            r#"
            SELECT id::text AS id, external_ref, start_at, status,
                   home_score::float8 AS home_score, away_score::float8 AS away_score, metadata
            FROM league_matches
            WHERE league_id::text = $1
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SyncError::store("Failed to load existing matches"))?;

        debug!(league_id, rows = rows.len(), "Loaded existing matches");
        Ok(rows)
    }

    async fn insert_matches(&self, payloads: &[MatchUpsertPayload]) -> SyncResult<()> {
        if payloads.is_empty() {
            return Ok(());
        }

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO league_matches (league_id, home_team, away_team, start_at, status, home_score, away_score, external_ref, metadata) ",
        );
        query.push_values(payloads, |mut row, payload| {
            row.push_bind(&payload.league_id)
                .push_unseparated("::uuid")
                .push_bind(&payload.home_team)
                .push_bind(&payload.away_team)
                .push_bind(payload.start_at)
                .push_bind(payload.status.as_str())
                .push_bind(payload.home_score)
                .push_bind(payload.away_score)
                .push_bind(&payload.external_ref)
                .push_bind(Json(&payload.metadata));
        });

        query
            .build()
            .execute(&self.pool)
            .await
            .map_err(SyncError::store("Failed to insert matches"))?;
        Ok(())
    }

    async fn update_match(&self, match_id: &str, payload: &MatchUpsertPayload) -> SyncResult<()> {
        sqlx::query(
            r#"
            UPDATE league_matches
            SET start_at = $1, status = $2, home_score = $3, away_score = $4, metadata = $5
            WHERE id::text = $6
            "#,
        )
        .bind(payload.start_at)
        .bind(payload.status.as_str())
        .bind(payload.home_score)
        .bind(payload.away_score)
        .bind(Json(&payload.metadata))
        .bind(match_id)
        .execute(&self.pool)
        .await
        .map_err(SyncError::store(format!("Failed to update match {match_id}")))?;
        Ok(())
    }

    async fn evaluate_league_completion(&self, league_id: &str) -> SyncResult<()> {
        sqlx::query("SELECT evaluate_league_completion(p_league_id => $1::uuid)")
            .bind(league_id)
            .execute(&self.pool)
            .await
            .map_err(SyncError::store("Failed to evaluate league completion"))?;
        Ok(())
    }
}

#[async_trait]
impl PredictionStore for PgMatchStore {
    async fn fetch_league_ids(&self) -> SyncResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT id::text FROM leagues ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(SyncError::store("Failed to fetch leagues"))
    }

    async fn fetch_league_results(&self, league_id: &str) -> SyncResult<Vec<MatchResult>> {
        sqlx::query_as::<_, MatchResult>(
            r#"
            SELECT id::text AS id, home_score::int4 AS home_score, away_score::int4 AS away_score
            FROM league_matches
            WHERE league_id::text = $1
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SyncError::store("Unable to fetch matches"))
    }

    async fn fetch_league_predictions(&self, league_id: &str) -> SyncResult<Vec<PredictionRow>> {
        sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT id::bigint AS id, match_id::text AS match_id, user_id::text AS user_id,
                   home_score, away_score, confident
            FROM league_predictions
            WHERE league_id::text = $1
            "#,
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(SyncError::store("Unable to fetch predictions"))
    }

    async fn update_prediction_points(&self, prediction_id: i64, points: f64) -> SyncResult<()> {
        sqlx::query(
            r#"
            UPDATE league_predictions
            SET points = $1, status = 'submitted'
            WHERE id = $2
            "#,
        )
        .bind(points)
        .bind(prediction_id)
        .execute(&self.pool)
        .await
        .map_err(SyncError::store(format!("Unable to update prediction {prediction_id}")))?;
        Ok(())
    }
}
