//! HTTP request handlers

use super::state::AppState;
use crate::auth::bearer_token;
use crate::error::{AuthExchangeError, ConnectorError, ValidationError};
use crate::search::ResponseEnvelope;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

/// Name of the search term in both the query string and a JSON body
const SEARCH_TERM: &str = "searchTerm";

/// JSON body accepted in place of the query parameter
#[derive(Debug, Default, Deserialize)]
struct ConnectorBody {
    #[serde(rename = "searchTerm")]
    search_term: Option<String>,
}

/// Search-and-fetch endpoint
pub async fn connector(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!("{} request for url \"{}\"", method, uri);

    match handle(&state, params, &headers, &body).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(e) => {
            warn!("Request failed: {}", e);
            e.into_response()
        }
    }
}

async fn handle(
    state: &AppState,
    params: Vec<(String, String)>,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<ResponseEnvelope, ConnectorError> {
    let search_term = search_term(&params, body).ok_or(ValidationError::MissingSearchTerm)?;

    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingAuthorization)?;
    let user_token = bearer_token(auth_header).ok_or(AuthExchangeError::MissingBearer)?;

    let token = state.exchanger.exchange(user_token).await?;

    state.search.run(&token, &search_term).await
}

/// `searchTerm` from the query string, falling back to a JSON body.
/// A repeated parameter resolves to its first value. Empty values count as
/// missing; an unparsable body is ignored.
fn search_term(params: &[(String, String)], body: &[u8]) -> Option<String> {
    let from_query = params
        .iter()
        .find(|(key, _)| key == SEARCH_TERM)
        .map(|(_, value)| value)
        .filter(|t| !t.is_empty());
    if let Some(term) = from_query {
        return Some(term.clone());
    }
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice::<ConnectorBody>(body)
        .ok()
        .and_then(|b| b.search_term)
        .filter(|t| !t.is_empty())
}

/// Health check handler
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION
    }))
}
