use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fixture_sync::config::SyncConfig;
use fixture_sync::leaderboard::compute_leaderboard;
use fixture_sync::metrics::MetricsCollector;
use fixture_sync::provider_config::default_registry;
use fixture_sync::providers::HttpFixtureSource;
use fixture_sync::store::{PgMatchStore, PredictionStore};
use fixture_sync::sync::{SyncOptions, SyncOrchestrator, SyncResponse};
use fixture_sync::web;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the HTTP sync trigger
    Serve,
    /// Run one sync pass and print the summaries as JSON
    Sync {
        /// Only sync these leagues (repeatable)
        #[arg(short, long = "league-id")]
        league_id: Vec<String>,
        /// Override the configured season for every championship
        #[arg(short, long)]
        season: Option<i32>,
    },
    /// Print the point totals for a league
    Leaderboard {
        league_id: String,
    },
}

async fn connect(config: &SyncConfig) -> Result<PgMatchStore> {
    Ok(PgMatchStore::connect(config.database_url()?, config.database.max_connections).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = SyncConfig::from_env();

    match cli.command {
        Commands::Serve => {
            web::serve(&config).await?;
        }
        Commands::Sync { league_id, season } => {
            let store = connect(&config).await?;
            let metrics = MetricsCollector::new();
            let source = HttpFixtureSource::new(&config, metrics.clone())?;
            let orchestrator =
                SyncOrchestrator::new(Arc::new(store), Arc::new(source), default_registry(), metrics);

            let options = SyncOptions {
                season_override: season,
            };
            let results = orchestrator.sync_leagues(&league_id, Utc::now(), &options).await?;
            println!("{}", serde_json::to_string_pretty(&SyncResponse::from(results))?);
        }
        Commands::Leaderboard { league_id } => {
            let store = connect(&config).await?;
            let matches = store.fetch_league_results(&league_id).await?;
            let predictions = store.fetch_league_predictions(&league_id).await?;
            info!(
                "Loaded {} matches and {} predictions for league {}",
                matches.len(),
                predictions.len(),
                league_id
            );

            for (rank, entry) in compute_leaderboard(&matches, &predictions).iter().enumerate() {
                println!("{:>3}. {:<40} {:>8.2}", rank + 1, entry.user_id, entry.score);
            }
        }
    }

    Ok(())
}
