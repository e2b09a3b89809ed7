use anyhow::{anyhow, Result};
use tracing::warn;

use crate::models::{DocumentCategory, NumberLogEntry};
use crate::services::state::AppState;
use crate::utils::now_rfc3339;

pub async fn generate_number(state: &AppState, category: &str, preview: bool) -> Result<String> {
    let category = parse_category(category)?;
    let number = state
        .generator()
        .generate_next(category.as_str(), !preview)
        .await;
    if !preview {
        record(state, &category, &number, "generate");
    }
    Ok(number)
}

pub async fn current_number(state: &AppState, category: &str) -> Result<String> {
    let category = parse_category(category)?;
    Ok(state
        .generator()
        .current_without_increment(category.as_str())
        .await)
}

pub async fn reset_number(state: &AppState, category: &str) -> Result<()> {
    let category = parse_category(category)?;
    state.generator().reset(category.as_str()).await?;
    Ok(())
}

pub async fn override_number(state: &AppState, category: &str, value: &str) -> Result<()> {
    let category = parse_category(category)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(anyhow!("Override value must not be empty"));
    }
    state
        .generator()
        .set_override(category.as_str(), value)
        .await?;
    record(state, &category, value, "override");
    Ok(())
}

pub fn number_history(state: &AppState, category: &str, limit: usize) -> Result<Vec<NumberLogEntry>> {
    let category = parse_category(category)?;
    let db = state.store.database()?;
    Ok(db.get_number_log(category.as_str(), limit)?)
}

fn parse_category(raw: &str) -> Result<DocumentCategory> {
    let category = DocumentCategory::new(raw);
    if category.as_str().is_empty() {
        return Err(anyhow!("Category must not be empty"));
    }
    Ok(category)
}

/// History is informational; a failed write never fails the command.
fn record(state: &AppState, category: &DocumentCategory, number: &str, source: &str) {
    let result = state.store.database().map_err(anyhow::Error::from).and_then(|db| {
        db.log_number(category.as_str(), number, source, &now_rfc3339())
            .map_err(anyhow::Error::from)
    });
    if let Err(err) = result {
        warn!(%category, error = %err, "Could not record number history");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Settings;
    use crate::store::SqliteStore;
    use std::sync::Arc;

    fn offline_state() -> AppState {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        AppState::with_settings(store, Settings::default()).unwrap()
    }

    #[tokio::test]
    async fn generate_records_history_but_preview_does_not() {
        let state = offline_state();

        assert_eq!(generate_number(&state, "Payment", false).await.unwrap(), "PAY-001");
        assert_eq!(generate_number(&state, "payment", true).await.unwrap(), "PAY-001");
        assert_eq!(generate_number(&state, "payment", false).await.unwrap(), "PAY-002");

        let history = number_history(&state, "payment", 10).unwrap();
        let numbers: Vec<_> = history.iter().map(|e| e.document_number.as_str()).collect();
        assert_eq!(numbers, vec!["PAY-002", "PAY-001"]);
    }

    #[tokio::test]
    async fn override_then_reset() {
        let state = offline_state();

        override_number(&state, "rent", "REN-041").await.unwrap();
        assert_eq!(current_number(&state, "rent").await.unwrap(), "REN-041");
        assert_eq!(generate_number(&state, "rent", false).await.unwrap(), "REN-042");

        reset_number(&state, "rent").await.unwrap();
        assert_eq!(current_number(&state, "rent").await.unwrap(), "REN-001");
    }

    #[tokio::test]
    async fn blank_input_is_rejected() {
        let state = offline_state();
        assert!(generate_number(&state, "   ", false).await.is_err());
        assert!(override_number(&state, "rent", " ").await.is_err());
    }
}
