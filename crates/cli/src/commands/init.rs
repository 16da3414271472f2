//! `doppel init` — write a default config file.

use anyhow::bail;
use doppel_config::AppConfig;

pub fn run() -> anyhow::Result<()> {
    let path = std::path::Path::new("doppel.toml");
    if path.exists() {
        bail!("doppel.toml already exists, refusing to overwrite");
    }

    std::fs::write(path, AppConfig::default_toml())?;
    println!("Wrote doppel.toml. Fill in your API keys and owner details.");
    Ok(())
}
