use anyhow::Result;

use crate::models::Settings;
use crate::services::state::{load_settings, save_setting, AppState};

/// Settings as stored, without per-run overrides.
pub async fn get_settings(state: &AppState) -> Result<Settings> {
    load_settings(state.store.as_ref()).await
}

pub async fn set_setting(state: &AppState, key: &str, value: &str) -> Result<()> {
    save_setting(state.store.as_ref(), key, value).await
}
