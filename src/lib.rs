pub mod commands;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod utils;

pub use error::{CryptoError, RemoteError, SessionError, StoreError};
pub use models::{DocumentCategory, NumberField, QueryShape, RemoteDocument, Settings, TransactionType};
pub use services::ledger::{HttpLedgerClient, LedgerBackend, OfflineLedger, RemoteLedger};
pub use services::numbering::{next_number, resolve_prefix, DocumentNumberGenerator};
pub use services::session::Session;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use utils::{extract_numeric_value, format_with_padding};
