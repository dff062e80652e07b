use matbook_core::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE, MatbookConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
    let config = MatbookConfig::load_or_default(&path)?;
    matbook_server::init_tracing(&config.logging.filter);
    tracing::info!(config = %path, "Loaded configuration");
    matbook_server::serve(config).await
}
