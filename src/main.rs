use anyhow::Context;
use negotiation_billing::{config::Config, db::init_db, NegotiationService, Repository};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;

    let pool = init_db(&config.database_path, config.max_connections)
        .await
        .with_context(|| format!("failed to initialize database at {}", config.database_path))?;

    let repo = Arc::new(Repository::new(pool));
    let service = NegotiationService::new(repo, config);

    // Schedules left pending by an earlier failed run are generated now.
    let sweep = service
        .complete_pending_generation()
        .await
        .context("failed to list pending negotiations")?;

    tracing::info!(
        generated = sweep.reports.len(),
        still_pending = sweep.failed.len(),
        "Database ready"
    );

    if !sweep.failed.is_empty() {
        anyhow::bail!(
            "{} negotiation(s) still have pending schedules",
            sweep.failed.len()
        );
    }
    Ok(())
}
