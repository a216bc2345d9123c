pub mod config;
pub mod error;
pub mod leaderboard;
pub mod league_start;
pub mod match_sync;
pub mod metrics;
pub mod provider_config;
pub mod providers;
pub mod scoring;
pub mod store;
pub mod sync;
pub mod time_utils;
pub mod types;
pub mod web;

pub use error::{SyncError, SyncResult};
pub use league_start::has_league_started;
pub use match_sync::{build_upsert_payload, has_match_changed, map_provider_status, normalize_fixture};
pub use scoring::{compute_prediction_points, compute_prediction_points_rounded};
pub use sync::{SyncOptions, SyncOrchestrator, SyncSummary};
