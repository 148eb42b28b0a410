//! graph-file-search: keyword search over a user's Microsoft Graph files
//!
//! One HTTP endpoint exchanges the caller's bearer token for a delegated
//! Graph token, runs a drive item search and returns every matching file's
//! content base64-encoded.

pub mod auth;
pub mod config;
pub mod error;
pub mod graph;
pub mod harness;
pub mod network;
pub mod search;
pub mod web;

pub use config::Settings;
pub use error::ConnectorError;
pub use search::{FetchedFile, ResponseEnvelope, Search};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
