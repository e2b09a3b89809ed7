pub mod numbers;
pub mod session;
pub mod settings;
