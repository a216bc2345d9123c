use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::SyncResult;
use crate::match_sync::{build_upsert_payload, has_match_changed, normalize_fixture};
use crate::metrics::MetricsCollector;
use crate::provider_config::{ChampionshipProviderConfig, ProviderRegistry};
use crate::providers::FixtureSource;
use crate::store::{LeagueMatchRow, LeagueRow, MatchStore};
use crate::types::{ExistingMatchSnapshot, MatchUpsertPayload, NormalizedFixture};

pub const NO_FIXTURES_MESSAGE: &str = "No fixtures returned by provider";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Replaces the season configured for a championship.
    pub season_override: Option<i32>,
}

/// Outcome for one league in a sync pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub league_id: String,
    pub league_name: String,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SyncSummary {
    fn skipped(league: &LeagueRow, message: String) -> Self {
        Self {
            league_id: league.id.clone(),
            league_name: league.name.clone(),
            inserted: 0,
            updated: 0,
            skipped: true,
            message: Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub processed: usize,
    pub results: Vec<SyncSummary>,
}

impl From<Vec<SyncSummary>> for SyncResponse {
    fn from(results: Vec<SyncSummary>) -> Self {
        Self {
            processed: results.len(),
            results,
        }
    }
}

/// Pulls provider fixtures for each league and writes the differences to the store.
///
/// Leagues are processed one after another. A failure inside one league ends up in
/// that league's summary and the pass carries on with the next one.
#[derive(Clone)]
pub struct SyncOrchestrator {
    store: Arc<dyn MatchStore>,
    source: Arc<dyn FixtureSource>,
    registry: ProviderRegistry,
    metrics: MetricsCollector,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn MatchStore>,
        source: Arc<dyn FixtureSource>,
        registry: ProviderRegistry,
        metrics: MetricsCollector,
    ) -> Self {
        Self {
            store,
            source,
            registry,
            metrics,
        }
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Syncs every league with a championship, or only `league_ids` when given.
    ///
    /// Only a failure to list the leagues is returned as an error.
    pub async fn sync_leagues(
        &self,
        league_ids: &[String],
        now: DateTime<Utc>,
        options: &SyncOptions,
    ) -> SyncResult<Vec<SyncSummary>> {
        let start = Instant::now();
        let leagues = self.store.fetch_leagues(league_ids).await?;
        info!("Syncing fixtures for {} leagues", leagues.len());

        let mut results = Vec::with_capacity(leagues.len());
        for league in &leagues {
            let championship = league.championship.as_deref().unwrap_or_default();
            let Some(config) = self.registry.get(championship) else {
                warn!(league_id = %league.id, championship, "No provider mapping, skipping league");
                results.push(SyncSummary::skipped(
                    league,
                    format!("No provider mapping for championship {championship}"),
                ));
                continue;
            };

            let summary = match self.sync_league(league, config, now, options).await {
                Ok(summary) => summary,
                Err(e) => {
                    error!(league_id = %league.id, "Failed to sync league: {}", e);
                    SyncSummary::skipped(league, e.to_string())
                }
            };
            results.push(summary);
        }

        let skipped = results.iter().filter(|r| r.skipped).count() as u64;
        self.metrics
            .record_sync(now, results.len() as u64 - skipped, skipped);
        info!(
            "Sync pass finished: {} leagues, {} skipped in {} ms",
            results.len(),
            skipped,
            start.elapsed().as_millis()
        );
        Ok(results)
    }

    pub async fn sync_league(
        &self,
        league: &LeagueRow,
        config: &ChampionshipProviderConfig,
        now: DateTime<Utc>,
        options: &SyncOptions,
    ) -> SyncResult<SyncSummary> {
        let fixtures = self
            .source
            .fetch_fixtures(&league.id, config, now, options)
            .await?;

        if fixtures.is_empty() {
            info!(league_id = %league.id, "Provider returned no fixtures");
            return Ok(SyncSummary {
                league_id: league.id.clone(),
                league_name: league.name.clone(),
                inserted: 0,
                updated: 0,
                skipped: false,
                message: Some(NO_FIXTURES_MESSAGE.to_string()),
            });
        }

        let normalized: Vec<NormalizedFixture> = fixtures
            .iter()
            .map(|fixture| normalize_fixture(fixture, now))
            .collect();
        let existing = self.store.fetch_league_matches(&league.id).await?;
        let (to_insert, to_update) = plan_writes(&league.id, config, &normalized, &existing);
        debug!(
            league_id = %league.id,
            fixtures = fixtures.len(),
            inserts = to_insert.len(),
            updates = to_update.len(),
            "Planned writes"
        );

        self.store.insert_matches(&to_insert).await?;
        for (match_id, payload) in &to_update {
            self.store.update_match(match_id, payload).await?;
        }
        self.store.evaluate_league_completion(&league.id).await?;

        info!(
            "League {} ({}): {} inserted, {} updated",
            league.name,
            league.id,
            to_insert.len(),
            to_update.len()
        );
        Ok(SyncSummary {
            league_id: league.id.clone(),
            league_name: league.name.clone(),
            inserted: to_insert.len(),
            updated: to_update.len(),
            skipped: false,
            message: None,
        })
    }
}

/// Splits normalized fixtures into new rows and changed rows (keyed by stored id).
/// Unchanged fixtures and stored rows without an external ref are left alone.
pub fn plan_writes(
    league_id: &str,
    config: &ChampionshipProviderConfig,
    normalized: &[NormalizedFixture],
    existing: &[LeagueMatchRow],
) -> (Vec<MatchUpsertPayload>, Vec<(String, MatchUpsertPayload)>) {
    let by_ref: HashMap<&str, (&str, ExistingMatchSnapshot)> = existing
        .iter()
        .filter_map(|row| {
            let external_ref = row.external_ref.as_deref()?;
            Some((external_ref, (row.id.as_str(), row.snapshot())))
        })
        .collect();

    let provider = config.provider.as_str();
    let mut inserts = Vec::new();
    let mut updates = Vec::new();
    for fixture in normalized {
        match by_ref.get(fixture.external_ref.as_str()) {
            None => inserts.push(build_upsert_payload(league_id, fixture, provider)),
            Some((match_id, snapshot)) => {
                if has_match_changed(Some(snapshot), fixture) {
                    updates.push((
                        match_id.to_string(),
                        build_upsert_payload(league_id, fixture, provider),
                    ));
                }
            }
        }
    }
    (inserts, updates)
}
