use anyhow::{Context, Result};
use std::path::PathBuf;

use super::runtime;

pub fn show(config_path: Option<PathBuf>) -> Result<()> {
    let service = runtime::config_service(config_path);
    let config = service.get_config()?;

    println!("# {}", service.config_path()?.display());
    print!(
        "{}",
        toml::to_string_pretty(&config).context("Failed to render configuration")?
    );
    Ok(())
}
