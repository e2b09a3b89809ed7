use std::sync::Arc;
use tracing::info;

use crate::error::SessionError;
use crate::services::crypto::CryptoService;
use crate::store::{KeyValueStore, AUTH_TOKEN_KEY};

/// Owns the auth token and the logout hook for everything in the store.
pub struct Session<S> {
    store: Arc<S>,
}

impl<S> Clone for Session<S> {
    fn clone(&self) -> Self {
        Session {
            store: self.store.clone(),
        }
    }
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: Arc<S>) -> Self {
        Session { store }
    }

    pub async fn login(&self, token: &str, encrypt: bool) -> Result<(), SessionError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let stored = if encrypt {
            CryptoService::encrypt_token(token)?
        } else {
            token.to_string()
        };
        self.store.set(AUTH_TOKEN_KEY, &stored).await?;
        info!(encrypted = encrypt, "Stored auth token");
        Ok(())
    }

    /// The bearer token, or `None` when nobody is logged in.
    pub async fn auth_token(&self) -> Result<Option<String>, SessionError> {
        let Some(stored) = self.store.get(AUTH_TOKEN_KEY).await? else {
            return Ok(None);
        };
        let token = CryptoService::decrypt_token(stored.trim())?;
        Ok(Some(token).filter(|t| !t.is_empty()))
    }

    pub async fn is_logged_in(&self) -> bool {
        matches!(self.auth_token().await, Ok(Some(_)))
    }

    /// Clears the whole store. Every document counter restarts afterwards.
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.store.clear().await?;
        info!("Session cleared");
        Ok(())
    }
}
