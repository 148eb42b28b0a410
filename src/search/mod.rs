//! Search orchestration module
//!
//! Runs the Graph search for one request and fans out content retrieval
//! for every drive item hit.

mod executor;
mod models;

pub use executor::Search;
pub use models::*;
