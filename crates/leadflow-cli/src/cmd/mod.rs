pub mod check;
pub mod config;
pub mod generate;
pub mod migrate;
pub mod prompt;
pub mod serve;

use anyhow::{anyhow, Context};
use completion_client::{ClientConfig, CompletionBackend, CompletionClient};
use leadflow_core::config::Config;
use leadflow_core::store::PgStore;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Config file at `path` with environment overrides applied.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = Config::load(path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    Ok(config.with_env()?)
}

pub async fn connect_store(config: &Config) -> anyhow::Result<PgStore> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("database.url is not set (or DATABASE_URL)"))?;
    let store = PgStore::connect(url, config.database.max_connections)
        .await
        .context("failed to connect to database")?;
    Ok(store)
}

pub fn completion_client(config: &Config) -> anyhow::Result<Arc<dyn CompletionBackend>> {
    let completion = &config.completion;
    let api_key = completion
        .api_key
        .clone()
        .ok_or_else(|| anyhow!("completion.api_key is not set (or OPENAI_API_KEY)"))?;
    let client = CompletionClient::new(
        ClientConfig::with_api_key(api_key)
            .base_url(completion.base_url.clone())
            .timeout(Duration::from_secs(completion.timeout_secs)),
    )?;
    Ok(Arc::new(client))
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid JSON in {}", path.display()))
}
