//! Sequential document numbers such as `PAY-007`.
//!
//! The ledger API is authoritative once it holds any document of a category.
//! Until then the last number cached in the local store is used. A preview
//! (`persist == false`) reuses the cached number so that opening and
//! abandoning a create form never burns a number, while a persisting call
//! claims the number and moves past it.
//!
//! Two concurrent calls for the same category may hand out the same number;
//! the store is not transactional and the last write wins.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::models::DocumentCategory;
use crate::services::ledger::RemoteLedger;
use crate::services::session::Session;
use crate::store::KeyValueStore;
use crate::utils::{extract_numeric_value, format_document_number};

pub fn resolve_prefix(category: &str) -> String {
    DocumentCategory::new(category).prefix()
}

/// Picks the number to hand out from the backend and local high-water marks.
pub fn next_number(backend_max: u64, local_max: u64, persist: bool) -> u64 {
    if backend_max > 0 {
        backend_max.saturating_add(1)
    } else if local_max > 0 {
        if persist {
            local_max.saturating_add(1)
        } else {
            local_max
        }
    } else {
        1
    }
}

pub struct DocumentNumberGenerator<S, R> {
    store: Arc<S>,
    session: Session<S>,
    ledger: R,
}

impl<S: KeyValueStore, R: RemoteLedger> DocumentNumberGenerator<S, R> {
    pub fn new(store: Arc<S>, ledger: R) -> Self {
        let session = Session::new(store.clone());
        DocumentNumberGenerator {
            store,
            session,
            ledger,
        }
    }

    /// Highest number of `category` already saved on the ledger API, or 0
    /// when that cannot be determined.
    pub async fn fetch_backend_maximum(&self, category: &str) -> u64 {
        self.backend_maximum(&DocumentCategory::new(category)).await
    }

    async fn backend_maximum(&self, category: &DocumentCategory) -> u64 {
        let token = match self.session.auth_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!(%category, "No auth token, skipping backend lookup");
                return 0;
            }
            Err(err) => {
                warn!(%category, error = %err, "Could not read auth token");
                return 0;
            }
        };

        let Some(shape) = category.query_shape() else {
            debug!(%category, "No backend mapping for category");
            return 0;
        };

        let documents = match self
            .ledger
            .list_documents(&token, shape.transaction_type)
            .await
        {
            Ok(documents) => documents,
            Err(err) => {
                warn!(%category, error = %err, "Backend lookup failed, assuming no history");
                return 0;
            }
        };

        let marker = format!("{}-", category.prefix());
        let max = documents
            .iter()
            .filter_map(|doc| shape.number_field.value(doc))
            .filter(|number| number.to_uppercase().starts_with(&marker))
            .map(|number| extract_numeric_value(Some(number)))
            .max()
            .unwrap_or(0);
        debug!(
            %category,
            field = shape.number_field.json_name(),
            records = documents.len(),
            max,
            "Backend maximum resolved"
        );
        max
    }

    /// Next number for `category`. Never fails: on storage errors the
    /// sequence restarts at `001`.
    pub async fn generate_next(&self, category: &str, persist: bool) -> String {
        let category = DocumentCategory::new(category);
        let prefix = category.prefix();

        match self.try_generate(&category, &prefix, persist).await {
            Ok(number) => number,
            Err(err) => {
                warn!(%category, error = %err, "Number generation failed, falling back");
                let fallback = format_document_number(&prefix, 1);
                if persist {
                    if let Err(err) = self.store.set(&category.counter_key(), &fallback).await {
                        warn!(%category, error = %err, "Could not persist fallback number");
                    }
                }
                fallback
            }
        }
    }

    async fn try_generate(
        &self,
        category: &DocumentCategory,
        prefix: &str,
        persist: bool,
    ) -> Result<String, StoreError> {
        let backend_max = self.backend_maximum(category).await;

        let key = category.counter_key();
        let local = self.store.get(&key).await?;
        let local_max = extract_numeric_value(local.as_deref());

        let next = next_number(backend_max, local_max, persist);
        let formatted = format_document_number(prefix, next);
        if persist {
            self.store.set(&key, &formatted).await?;
        }

        debug!(%category, backend_max, local_max, persist, number = %formatted, "Generated number");
        Ok(formatted)
    }

    /// Stored number as-is, or the first number of the sequence. Reads only.
    pub async fn current_without_increment(&self, category: &str) -> String {
        let category = DocumentCategory::new(category);
        match self.store.get(&category.counter_key()).await {
            Ok(Some(stored)) if !stored.is_empty() => stored,
            Ok(_) => format_document_number(&category.prefix(), 1),
            Err(err) => {
                warn!(%category, error = %err, "Could not read stored number");
                format_document_number(&category.prefix(), 1)
            }
        }
    }

    pub async fn reset(&self, category: &str) -> Result<(), StoreError> {
        let category = DocumentCategory::new(category);
        self.store.remove(&category.counter_key()).await?;
        debug!(%category, "Counter reset");
        Ok(())
    }

    /// Manual correction: stores `value` verbatim as the last number.
    pub async fn set_override(&self, category: &str, value: &str) -> Result<(), StoreError> {
        let category = DocumentCategory::new(category);
        self.store.set(&category.counter_key(), value).await?;
        debug!(%category, value, "Counter overridden");
        Ok(())
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }
}
