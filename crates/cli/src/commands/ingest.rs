//! `doppel ingest` — index a profile document.

use std::path::Path;

use anyhow::Context;
use doppel_config::AppConfig;

use crate::bootstrap;

pub async fn run(file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;

    let config = AppConfig::load()?;
    let runtime = bootstrap::build(config)?;

    let source = file.file_name().and_then(|n| n.to_str());
    let report = runtime.ingestor().ingest(&text, source).await?;

    if report.skipped {
        println!("Document unchanged, nothing to do.");
    } else {
        println!("Ingested {} chunks into '{}'.", report.chunks, runtime.config.index.namespace);
    }
    Ok(())
}
