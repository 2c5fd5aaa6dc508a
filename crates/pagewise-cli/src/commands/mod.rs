//! Subcommand implementations.

pub mod batch;
pub mod check;
pub mod config;
pub mod extract;
pub mod process;

use std::path::Path;

use pagewise_core::PagewiseConfig;

/// Load the configuration named by `--config`, or the defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<PagewiseConfig> {
    match config_path {
        Some(path) => PagewiseConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e)),
        None => Ok(PagewiseConfig::default()),
    }
}

/// Fail early with a readable message when the input does not exist.
pub fn ensure_input(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}
