//! On-behalf-of token exchange
//!
//! Turns the caller's bearer token into a delegated token for Microsoft
//! Graph. Tokens are never cached; every request performs its own exchange.

mod obo;

pub use obo::{token_error_detail, OboTokenExchanger, JWT_BEARER_GRANT};

use crate::error::AuthExchangeError;
use async_trait::async_trait;

/// Exchanges an inbound user token for a delegated downstream token
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    async fn exchange(&self, user_token: &str) -> Result<DelegatedToken, AuthExchangeError>;
}

/// A short-lived access token issued on behalf of the calling user
#[derive(Clone, PartialEq, Eq)]
pub struct DelegatedToken(String);

impl DelegatedToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for use in an Authorization header
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for DelegatedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DelegatedToken(<redacted>)")
    }
}

/// Token part of an `Authorization: <scheme> <token>` header value.
///
/// The scheme is not checked; anything after the first whitespace-separated
/// word is taken as the token.
pub fn bearer_token(header: &str) -> Option<&str> {
    header.split_whitespace().nth(1)
}
