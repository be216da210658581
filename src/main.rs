use anyhow::Context;
use tracing_subscriber::EnvFilter;

use velax_indexer_rs::config::IndexerConfig;
use velax_indexer_rs::db::DbPool;
use velax_indexer_rs::indexer::Indexer;
use velax_indexer_rs::rpc::SuiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = IndexerConfig::from_env()?;

    let pool = DbPool::new(&config.database_url)
        .await
        .context("Failed to connect to the projection database")?;
    pool.run_migrations()
        .await
        .context("Failed to run database migrations")?;

    let client = SuiClient::from_url(&config.rpc_url)
        .with_context(|| format!("Failed to build RPC client for {}", config.rpc_url))?;

    tracing::info!(
        "Starting auction indexer for package {} against {}",
        config.package_id,
        config.rpc_url
    );

    let mut indexer = Indexer::new(client, pool, &config);
    indexer.run().await;

    Ok(())
}
