//! HTTP networking module
//!
//! Provides the shared outgoing HTTP client.

mod client;

pub use client::{user_agent, HttpClient};
