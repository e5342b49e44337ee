use order_store::{open_repository, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, config, logging)
    let config = setup_environment()?;

    tracing::info!(
        work_dir = %config.work_dir,
        engine = %config.storage_engine,
        "Order store starting..."
    );

    // 2. Open the store
    let repository = open_repository(&config)?;

    // 3. Check the id index against the primary records
    let report = tokio::task::spawn_blocking({
        let repository = repository.clone();
        move || repository.verify_index()
    })
    .await??;
    if report.is_consistent() {
        tracing::info!(
            orders = report.orders,
            index_entries = report.index_entries,
            "Index consistent"
        );
    } else {
        tracing::warn!(
            orders = report.orders,
            index_entries = report.index_entries,
            orphaned_index_entries = report.orphaned_index_entries.len(),
            dangling_orders = report.dangling_orders.len(),
            "Index inconsistent"
        );
        for key in &report.orphaned_index_entries {
            tracing::warn!(key = %key, "Index entry without order");
        }
        for key in &report.dangling_orders {
            tracing::warn!(key = %key, "Order without index entry");
        }
    }

    // 4. Serve until shutdown
    shutdown_signal().await?;

    repository.close()?;
    Ok(())
}

async fn shutdown_signal() -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Received Ctrl+C signal, shutting down...");
    Ok(())
}
