pub mod bulk;
pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod crypto;
pub mod envelope;
pub mod errors;
pub mod notify;
pub mod prompt;
pub mod session;
pub mod store;
