use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::input::read_rows;
use crate::pipeline::{Pipeline, RunMode};
use crate::report::CsvReport;

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_tiktok_creatives=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

/// Entry point shared by every binary.
pub async fn run(mode: RunMode) -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let csv_file = config
        .csv_file
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(mode.default_csv()));

    tracing::info!("Mode: {:?}, input: {}", mode, csv_file.display());
    let rows = read_rows(&csv_file)?;

    let mut report = CsvReport::create(
        &config.report_dir,
        mode.report_subdir(),
        mode.report_prefix(),
        mode.source_columns(),
    )?;

    let pipeline = Pipeline::new(&config)?;
    let written = pipeline.run(mode, &rows, &mut report).await?;

    tracing::info!(
        "✓ Done: {} records written to {}",
        written,
        report.path().display()
    );
    Ok(())
}
