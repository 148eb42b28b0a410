//! Configuration module for graph-file-search
//!
//! Settings are loaded once by the binary and handed to the components that
//! need them; nothing reads configuration from the environment afterwards.

mod settings;

pub use settings::*;
