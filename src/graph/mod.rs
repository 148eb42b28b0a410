//! Microsoft Graph access
//!
//! Typed search and drive item models plus the REST calls the connector
//! makes with a delegated token.

mod client;
mod models;

pub use client::GraphClient;
pub use models::*;
