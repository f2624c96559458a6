use std::sync::Arc;

use anyhow::Context;

use boxer_infra::{BoxerSettings, DirectoryWatcher, InMemoryBoxStore, IngestionPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    boxer_observability::init();

    let settings = BoxerSettings::from_env().context("failed to load settings")?;

    let store = Arc::new(InMemoryBoxStore::new());
    let handle = DirectoryWatcher::new(IngestionPipeline::new(store.clone()))
        .with_lock_retry(settings.lock_retry.clone())
        .spawn(&settings)
        .context("failed to start directory watcher")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutdown requested; finishing in-flight files");
    tokio::select! {
        _ = handle.shutdown() => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("second interrupt; abandoning in-flight files");
        }
    }
    tracing::info!(boxes_stored = store.len(), "stopped");

    Ok(())
}
