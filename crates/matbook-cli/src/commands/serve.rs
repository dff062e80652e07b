//! `matbook serve` command implementation.

use anyhow::{Context, Result};
use matbook_core::MatbookConfig;
use std::path::Path;

pub async fn run(config_path: &Path, bind: Option<String>) -> Result<()> {
    let mut config = MatbookConfig::load_or_default(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    tracing::info!(config = %config_path.display(), "Starting matbook-server");
    matbook_server::serve(config).await
}
