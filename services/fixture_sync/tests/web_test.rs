use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use fixture_sync::metrics::MetricsCollector;
use fixture_sync::provider_config::{ChampionshipProviderConfig, ProviderRegistry};
use fixture_sync::providers::{mock::mock_fixtures, FixtureSource};
use fixture_sync::store::{LeagueMatchRow, LeagueRow, MatchStore};
use fixture_sync::types::{MatchUpsertPayload, ProviderFixture};
use fixture_sync::web::{router, AppState};
use fixture_sync::{SyncError, SyncOptions, SyncOrchestrator, SyncResult};

#[derive(Default)]
struct MemoryStore {
    leagues: Vec<LeagueRow>,
    requested: Mutex<Vec<Vec<String>>>,
    inserted: Mutex<Vec<MatchUpsertPayload>>,
    broken: bool,
}

#[async_trait]
impl MatchStore for MemoryStore {
    async fn fetch_leagues(&self, ids: &[String]) -> SyncResult<Vec<LeagueRow>> {
        if self.broken {
            return Err(SyncError::Other("Failed to fetch leagues: connection reset".to_string()));
        }
        self.requested.lock().unwrap().push(ids.to_vec());
        Ok(self
            .leagues
            .iter()
            .filter(|league| ids.is_empty() || ids.contains(&league.id))
            .cloned()
            .collect())
    }

    async fn fetch_league_matches(&self, _league_id: &str) -> SyncResult<Vec<LeagueMatchRow>> {
        Ok(Vec::new())
    }

    async fn insert_matches(&self, payloads: &[MatchUpsertPayload]) -> SyncResult<()> {
        self.inserted.lock().unwrap().extend_from_slice(payloads);
        Ok(())
    }

    async fn update_match(&self, _match_id: &str, _payload: &MatchUpsertPayload) -> SyncResult<()> {
        Ok(())
    }

    async fn evaluate_league_completion(&self, _league_id: &str) -> SyncResult<()> {
        Ok(())
    }
}

struct MockOnlySource;

#[async_trait]
impl FixtureSource for MockOnlySource {
    async fn fetch_fixtures(
        &self,
        league_id: &str,
        _config: &ChampionshipProviderConfig,
        now: DateTime<Utc>,
        _options: &SyncOptions,
    ) -> SyncResult<Vec<ProviderFixture>> {
        Ok(mock_fixtures(league_id, now))
    }
}

fn league(id: &str, name: &str, championship: &str) -> LeagueRow {
    LeagueRow {
        id: id.to_string(),
        name: name.to_string(),
        championship: Some(championship.to_string()),
        status: None,
    }
}

fn server_with(store: Arc<MemoryStore>, secret: Option<&str>) -> TestServer {
    let registry = ProviderRegistry::new().with("nba", ChampionshipProviderConfig::mock());
    let orchestrator =
        SyncOrchestrator::new(store, Arc::new(MockOnlySource), registry, MetricsCollector::new());
    let state = AppState::new(orchestrator, secret.map(str::to_string));
    TestServer::new(router(state)).unwrap()
}

fn default_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore {
        leagues: vec![
            league("l1", "Office NBA", "nba"),
            league("l2", "Pub Quiz Cup", "darts"),
        ],
        ..Default::default()
    })
}

#[tokio::test]
async fn test_non_post_is_rejected() {
    let server = server_with(default_store(), None);
    let response = server.get("/sync-matches").await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn test_secret_is_required_when_configured() {
    let store = default_store();
    let server = server_with(store.clone(), Some("s3cret"));

    let response = server.post("/sync-matches").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Unauthorized" }));
    assert!(store.requested.lock().unwrap().is_empty());

    let response = server
        .post("/sync-matches")
        .add_header(
            HeaderName::from_static("authorization"),
            HeaderValue::from_static("Bearer s3cret"),
        )
        .await;
    response.assert_status_ok();
}

#[test_log::test(tokio::test)]
async fn test_sync_all_leagues() {
    let store = default_store();
    let server = server_with(store.clone(), None);

    let response = server.post("/sync-matches").await;
    response.assert_status_ok();
    assert_eq!(
        response.json::<Value>(),
        json!({
            "processed": 2,
            "results": [
                {
                    "leagueId": "l1",
                    "leagueName": "Office NBA",
                    "inserted": 2,
                    "updated": 0,
                    "skipped": false
                },
                {
                    "leagueId": "l2",
                    "leagueName": "Pub Quiz Cup",
                    "inserted": 0,
                    "updated": 0,
                    "skipped": true,
                    "message": "No provider mapping for championship darts"
                }
            ]
        })
    );

    let inserted = store.inserted.lock().unwrap();
    assert_eq!(inserted.len(), 2);
    assert_eq!(inserted[0].external_ref, "l1-mock-1");
    assert_eq!(inserted[0].metadata["provider"], json!("mock"));
    assert_eq!(inserted[0].metadata["provider_status"], json!("NS"));
}

#[tokio::test]
async fn test_requested_ids_from_query_and_body() {
    let store = default_store();
    let server = server_with(store.clone(), None);

    let response = server
        .post("/sync-matches")
        .add_query_param("leagueId", "l1")
        .json(&json!({ "leagueIds": ["l1", "l9", 3] }))
        .await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["processed"], json!(1));
    assert_eq!(
        *store.requested.lock().unwrap(),
        vec![vec!["l1".to_string(), "l9".to_string()]]
    );
}

#[tokio::test]
async fn test_repeated_league_id_in_query() {
    let store = default_store();
    let server = server_with(store.clone(), Some("s3cret"));

    let response = server
        .post("/sync-matches")
        .add_query_param("leagueId", "l1")
        .add_query_param("leagueId", "l2")
        .add_header(
            HeaderName::from_static("x-sync-secret"),
            HeaderValue::from_static("s3cret"),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["processed"], json!(1));
    assert_eq!(*store.requested.lock().unwrap(), vec![vec!["l1".to_string()]]);

    let response = server
        .post("/sync-matches")
        .add_query_param("leagueId", "l1")
        .add_query_param("leagueId", "l2")
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>(), json!({ "error": "Unauthorized" }));
}

#[tokio::test]
async fn test_store_failure_is_a_server_error() {
    let store = Arc::new(MemoryStore {
        broken: true,
        ..Default::default()
    });
    let server = server_with(store, None);

    let response = server.post("/sync-matches").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to fetch leagues: connection reset" })
    );
}

#[tokio::test]
async fn test_health_and_stats() {
    let store = default_store();
    let server = server_with(store, None);

    server.get("/health").await.assert_json(&json!({ "status": "ok" }));

    server.post("/sync-matches").await.assert_status_ok();
    let stats = server.get("/stats").await.json::<Value>();
    assert_eq!(stats["leagues_synced"], json!(1));
    assert_eq!(stats["leagues_skipped"], json!(1));
}
