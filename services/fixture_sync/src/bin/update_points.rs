use anyhow::Result;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fixture_sync::config::SyncConfig;
use fixture_sync::leaderboard::recompute_prediction_points;
use fixture_sync::store::{PgMatchStore, PredictionStore};

/// Recomputes stored points for every prediction on a resolved match.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SyncConfig::from_env();
    let store = PgMatchStore::connect(config.database_url()?, config.database.max_connections).await?;

    let league_ids = store.fetch_league_ids().await?;
    info!("Updating prediction points for {} leagues", league_ids.len());

    let progress = ProgressBar::new(league_ids.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} leagues ({eta})")?,
    );

    let mut updated = 0usize;
    for league_id in &league_ids {
        let matches = store.fetch_league_results(league_id).await?;
        let predictions = store.fetch_league_predictions(league_id).await?;

        for result in &matches {
            for (prediction_id, points) in recompute_prediction_points(result, &predictions) {
                if let Err(e) = store.update_prediction_points(prediction_id, points).await {
                    warn!("Skipping prediction {}: {}", prediction_id, e);
                    continue;
                }
                updated += 1;
            }
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    info!("Updated points on {} predictions", updated);
    Ok(())
}
