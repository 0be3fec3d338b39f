use std::env;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usage_pipeline::{DirectorySource, Pipeline, PipelineConfig};
use usage_protocol::Dex;

fn env_var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} is not set"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting usage-stats v{}", env!("CARGO_PKG_VERSION"));

    let config_path = env_var("USAGE_CONFIG")?;
    let dex_path = env_var("USAGE_DEX")?;
    let logs = env_var("USAGE_LOGS")?;

    let config = PipelineConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    let dex =
        Dex::load(&dex_path).with_context(|| format!("Failed to load dex from {dex_path}"))?;
    tracing::info!(species = dex.species_count(), tiers = config.tiers.len(), "loaded data");

    let pipeline = Pipeline::new(config, dex, DirectorySource::new(&logs))?;

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Interrupted, finishing in-flight logs");
                let _ = stop.send(true);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for ctrl-c"),
        }
    });

    let summary = pipeline.run(shutdown).await?;

    println!("{}", serde_json::to_string_pretty(&summary.snapshot())?);

    let report = &summary.report;
    tracing::info!(
        folded = report.folded,
        abandoned = report.abandoned_total(),
        skipped = report.skipped,
        "Done"
    );
    for (kind, count) in &report.abandoned {
        tracing::info!(kind = %kind, count, "abandoned");
    }

    Ok(())
}
