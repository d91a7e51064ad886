use chrono::Duration;
use raindrops_storage_client::StorageClient;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod jobs;

use jobs::orphan_sweep;
use jobs::SweepConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "raindrops_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = config::Config::from_env()?;

    tracing::info!("Starting Immortal Raindrops worker");

    let pool = PgPoolOptions::new()
        .max_connections(config.common.database.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(
            config.common.database.connect_timeout_secs,
        ))
        .connect(&config.common.database.url)
        .await?;
    tracing::info!("Database connection established");

    let storage = StorageClient::connect(&config.common.storage).await;
    tracing::info!(bucket = storage.bucket(), "Object storage client initialized");

    let sweep_config = SweepConfig {
        grace: Duration::seconds(config.orphan_grace_secs),
        dry_run: config.dry_run,
    };

    let mut interval =
        tokio::time::interval(std::time::Duration::from_secs(config.sweep_interval_secs));

    loop {
        interval.tick().await;

        if let Err(e) = orphan_sweep::run(&pool, &storage, &sweep_config).await {
            tracing::error!(error = %e, "orphan sweep failed");
        }
    }
}
