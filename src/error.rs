use thiserror::Error;

/// Errors from the key-value store backing the counters and the session.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the ledger API.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Invalid encrypted payload: {0}")]
    InvalidPayload(String),

    #[error("Encryption failed")]
    Encryption,

    #[error("Decryption failed")]
    Decryption,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Auth token is empty")]
    EmptyToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}
