use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::metrics::MetricsCollector;
use crate::provider_config::default_registry;
use crate::providers::HttpFixtureSource;
use crate::store::PgMatchStore;
use crate::sync::{SyncOptions, SyncOrchestrator, SyncResponse};

const SECRET_HEADERS: &[&str] = &["x-sync-secret", "x-benolo-sync-secret", "authorization"];

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SyncOrchestrator>,
    /// Shared secret for the sync trigger. `None` leaves it open.
    pub sync_secret: Option<String>,
}

impl AppState {
    pub fn new(orchestrator: SyncOrchestrator, sync_secret: Option<String>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sync_secret: sync_secret
                .map(|secret| secret.trim().to_string())
                .filter(|secret| !secret.is_empty()),
        }
    }
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// True when no secret is configured or any candidate header carries it,
/// either bare or as a bearer token.
pub fn is_authorized(headers: &HeaderMap, secret: Option<&str>) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let bearer = format!("Bearer {secret}");

    SECRET_HEADERS
        .iter()
        .flat_map(|name| headers.get_all(*name))
        .filter_map(|value| value.to_str().ok())
        .map(str::trim)
        .any(|value| value == secret || value == bearer)
}

/// League ids from the query string and the JSON body, de-duplicated in arrival order.
///
/// Only the first `leagueId` query pair is read. A body that is not JSON counts as empty,
/// and non-string array entries are dropped.
pub fn requested_league_ids(query: &[(String, String)], body: &[u8]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    let mut push = |id: &str| {
        if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    };

    if let Some((_, id)) = query.iter().find(|(key, _)| key == "leagueId") {
        push(id.as_str());
    }

    let body: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
    if let Some(id) = body["leagueId"].as_str() {
        push(id);
    }
    if let Some(list) = body["leagueIds"].as_array() {
        list.iter().filter_map(Value::as_str).for_each(&mut push);
    }
    ids
}

#[axum::debug_handler]
pub async fn sync_matches_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Response {
    if !is_authorized(&headers, state.sync_secret.as_deref()) {
        warn!("Rejected sync request with a missing or wrong secret");
        return json_error(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    let league_ids = requested_league_ids(&query, &body);
    info!(requested = league_ids.len(), "Sync requested");

    match state
        .orchestrator
        .sync_leagues(&league_ids, Utc::now(), &SyncOptions::default())
        .await
    {
        Ok(results) => Json(SyncResponse::from(results)).into_response(),
        Err(e) => {
            error!("Sync failed: {}", e);
            json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

pub async fn method_not_allowed() -> Response {
    json_error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[axum::debug_handler]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.metrics().get_metrics())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/sync-matches",
            post(sync_matches_handler).fallback(method_not_allowed),
        )
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires the Postgres store and provider client together and serves until Ctrl-C.
pub async fn serve(config: &SyncConfig) -> SyncResult<()> {
    let store = PgMatchStore::connect(config.database_url()?, config.database.max_connections).await?;
    let metrics = MetricsCollector::new();
    let source = HttpFixtureSource::new(config, metrics.clone())?;
    let orchestrator = SyncOrchestrator::new(
        Arc::new(store),
        Arc::new(source),
        default_registry(),
        metrics,
    );
    let app = router(AppState::new(orchestrator, config.server.sync_secret.clone()));

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    info!("Sync service listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
