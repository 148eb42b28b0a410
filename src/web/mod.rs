//! Web server module
//!
//! Provides the HTTP surface of the connector.

mod handlers;
mod routes;
mod state;

pub use routes::{create_router, CONNECTOR_PATH};
pub use state::AppState;
