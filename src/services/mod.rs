pub mod crypto;
pub mod ledger;
pub mod numbering;
pub mod session;
pub mod state;
