use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::models::Settings;
use crate::services::ledger::{HttpLedgerClient, LedgerBackend, OfflineLedger};
use crate::services::numbering::DocumentNumberGenerator;
use crate::services::session::Session;
use crate::store::{KeyValueStore, SqliteStore};

pub const API_BASE_URL_KEY: &str = "api_base_url";
pub const REQUEST_TIMEOUT_KEY: &str = "request_timeout_secs";

/// Everything a command needs: the store, the effective settings and the
/// generator wired to the configured ledger.
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub settings: Settings,
    generator: DocumentNumberGenerator<SqliteStore, LedgerBackend>,
}

impl AppState {
    pub async fn open(db_path: &Path, api_url_override: Option<String>) -> Result<Self> {
        let store = Arc::new(
            SqliteStore::open(db_path)
                .with_context(|| format!("Open database {}", db_path.display()))?,
        );
        let mut settings = load_settings(store.as_ref()).await?;
        if let Some(url) = api_url_override {
            settings.api_base_url = Some(url);
        }
        Self::with_settings(store, settings)
    }

    pub fn with_settings(store: Arc<SqliteStore>, settings: Settings) -> Result<Self> {
        let ledger = build_ledger(&settings)?;
        let generator = DocumentNumberGenerator::new(store.clone(), ledger);
        Ok(AppState {
            store,
            settings,
            generator,
        })
    }

    pub fn generator(&self) -> &DocumentNumberGenerator<SqliteStore, LedgerBackend> {
        &self.generator
    }

    pub fn session(&self) -> &Session<SqliteStore> {
        self.generator.session()
    }
}

fn build_ledger(settings: &Settings) -> Result<LedgerBackend> {
    match settings.api_base_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => {
            let timeout = Duration::from_secs(settings.request_timeout_secs);
            let client = HttpLedgerClient::new(url, timeout).context("Build ledger client")?;
            info!(base_url = client.base_url(), "Using ledger API");
            Ok(LedgerBackend::Http(client))
        }
        _ => {
            info!("No ledger API configured, numbering from local store only");
            Ok(LedgerBackend::Offline(OfflineLedger))
        }
    }
}

pub async fn load_settings<S: KeyValueStore>(store: &S) -> Result<Settings> {
    let defaults = Settings::default();
    let api_base_url = store
        .get(API_BASE_URL_KEY)
        .await?
        .filter(|url| !url.trim().is_empty());
    let request_timeout_secs = match store.get(REQUEST_TIMEOUT_KEY).await? {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|e| anyhow!("Stored {} is not a number: {}", REQUEST_TIMEOUT_KEY, e))?,
        None => defaults.request_timeout_secs,
    };
    Ok(Settings {
        api_base_url,
        request_timeout_secs,
    })
}

pub async fn save_setting<S: KeyValueStore>(store: &S, key: &str, value: &str) -> Result<()> {
    let value = value.trim();
    match key {
        API_BASE_URL_KEY => {
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                return Err(anyhow!("{} must start with http:// or https://", key));
            }
        }
        REQUEST_TIMEOUT_KEY => {
            let secs: u64 = value
                .parse()
                .map_err(|e| anyhow!("{} must be a whole number of seconds: {}", key, e))?;
            if secs == 0 {
                return Err(anyhow!("{} must be greater than zero", key));
            }
        }
        _ => return Err(anyhow!("Unknown setting: {}", key)),
    }
    store.set(key, value).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn settings_default_when_store_is_empty() {
        let store = MemoryStore::new();
        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings.api_base_url, None);
        assert_eq!(settings.request_timeout_secs, 10);
    }

    #[tokio::test]
    async fn saved_settings_are_loaded() {
        let store = MemoryStore::new();
        save_setting(&store, API_BASE_URL_KEY, " https://api.example.com ")
            .await
            .unwrap();
        save_setting(&store, REQUEST_TIMEOUT_KEY, "30").await.unwrap();

        let settings = load_settings(&store).await.unwrap();
        assert_eq!(settings.api_base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected() {
        let store = MemoryStore::new();
        assert!(save_setting(&store, API_BASE_URL_KEY, "ftp://x").await.is_err());
        assert!(save_setting(&store, REQUEST_TIMEOUT_KEY, "0").await.is_err());
        assert!(save_setting(&store, REQUEST_TIMEOUT_KEY, "soon").await.is_err());
        assert!(save_setting(&store, "theme", "dark").await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn offline_ledger_without_base_url() {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let state = AppState::with_settings(store, Settings::default()).unwrap();
        assert!(state.settings.api_base_url.is_none());
        assert_eq!(state.generator().generate_next("payment", true).await, "PAY-001");
    }
}
