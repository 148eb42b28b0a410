//! Error types for the connector.
//!
//! Each pipeline stage has its own error enum; [`ConnectorError`] folds them
//! together at the request boundary and decides the HTTP status and body.
//! Upstream payloads are logged where they are received, so the messages
//! here stay short.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Missing or unusable request input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing searchTerm parameter.")]
    MissingSearchTerm,

    #[error("Authorization header is missing")]
    MissingAuthorization,
}

/// The on-behalf-of exchange failed
#[derive(Debug, thiserror::Error)]
pub enum AuthExchangeError {
    /// The Authorization header had no token after the scheme.
    #[error("authorization header does not carry a bearer token")]
    MissingBearer,

    /// The identity provider answered with a non-success status.
    #[error("token endpoint returned {status}: {detail}")]
    Rejected { status: u16, detail: String },

    /// The identity provider could not be reached or timed out.
    #[error("token endpoint unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response without a usable access token.
    #[error("token endpoint response is malformed: {0}")]
    MalformedResponse(String),
}

/// The search query itself failed
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search returned {status}: {detail}")]
    Upstream { status: u16, detail: String },

    #[error("unexpected search response: {0}")]
    Decode(String),
}

/// Retrieving one file's content or metadata failed
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to fetch content for {name}: {reason}")]
    MalformedHit { name: String, reason: String },

    #[error("Failed to fetch content for {name}: {source}")]
    Transport {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to fetch content for {name}: drive returned {status}: {detail}")]
    Upstream {
        name: String,
        status: u16,
        detail: String,
    },

    #[error("Failed to fetch content for {name}: item has no file facet")]
    NotAFile { name: String },

    #[error("content retrieval exceeded {secs}s")]
    Timeout { secs: f64 },
}

impl FetchError {
    /// Name of the item the failure belongs to, if it is per-item
    pub fn item_name(&self) -> Option<&str> {
        match self {
            FetchError::MalformedHit { name, .. }
            | FetchError::Transport { name, .. }
            | FetchError::Upstream { name, .. }
            | FetchError::NotAFile { name } => Some(name),
            FetchError::Timeout { .. } => None,
        }
    }
}

/// Any failure of a connector request
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to obtain OBO token: {0}")]
    AuthExchange(#[from] AuthExchangeError),

    #[error("Error performing search or processing results: {0}")]
    Search(#[from] SearchError),

    #[error("Error performing search or processing results: {0}")]
    Fetch(#[from] FetchError),
}

impl ConnectorError {
    /// HTTP status for this failure
    pub fn status_code(&self) -> StatusCode {
        match self {
            ConnectorError::Validation(_) => StatusCode::BAD_REQUEST,
            ConnectorError::AuthExchange(_)
            | ConnectorError::Search(_)
            | ConnectorError::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ConnectorError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Convenience type alias for connector results.
pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_validation_messages() {
        let err = ConnectorError::from(ValidationError::MissingSearchTerm);
        assert_eq!(err.to_string(), "Missing searchTerm parameter.");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err = ConnectorError::from(ValidationError::MissingAuthorization);
        assert_eq!(err.to_string(), "Authorization header is missing");
    }

    #[test]
    fn display_auth_exchange() {
        let err = ConnectorError::from(AuthExchangeError::Rejected {
            status: 400,
            detail: "AADSTS50013: Assertion failed signature validation".into(),
        });
        assert_eq!(
            err.to_string(),
            "Failed to obtain OBO token: token endpoint returned 400: AADSTS50013: Assertion failed signature validation"
        );
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn display_search_and_fetch_share_prefix() {
        let search = ConnectorError::from(SearchError::Upstream {
            status: 403,
            detail: "Access denied".into(),
        });
        assert_eq!(
            search.to_string(),
            "Error performing search or processing results: search returned 403: Access denied"
        );

        let fetch = ConnectorError::from(FetchError::NotAFile {
            name: "Reports".into(),
        });
        assert_eq!(
            fetch.to_string(),
            "Error performing search or processing results: Failed to fetch content for Reports: item has no file facet"
        );
    }

    #[test]
    fn fetch_error_item_name() {
        let err = FetchError::MalformedHit {
            name: "a.txt".into(),
            reason: "missing parentReference.driveId".into(),
        };
        assert_eq!(err.item_name(), Some("a.txt"));
        assert_eq!(FetchError::Timeout { secs: 1.0 }.item_name(), None);
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConnectorError>();
    }
}
