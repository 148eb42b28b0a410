//! JWT-bearer on-behalf-of grant against the Microsoft identity platform

use super::{DelegatedToken, TokenExchanger};
use crate::config::AuthSettings;
use crate::error::AuthExchangeError;
use crate::network::HttpClient;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Grant type of the on-behalf-of flow
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Form body posted to the token endpoint
#[derive(Serialize)]
struct OboGrant<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    assertion: &'a str,
    requested_token_use: &'a str,
    scope: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Summarize an OAuth2 error response body
pub fn token_error_detail(body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(TokenErrorBody {
            error_description: Some(description),
            ..
        }) => description,
        Ok(TokenErrorBody {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.trim().to_string(),
    }
}

/// Token exchanger backed by the tenant's v2.0 token endpoint
pub struct OboTokenExchanger {
    client: HttpClient,
    settings: AuthSettings,
}

impl OboTokenExchanger {
    pub fn new(client: HttpClient, settings: AuthSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl TokenExchanger for OboTokenExchanger {
    async fn exchange(&self, user_token: &str) -> Result<DelegatedToken, AuthExchangeError> {
        let grant = OboGrant {
            client_id: &self.settings.client_id,
            client_secret: &self.settings.client_secret,
            grant_type: JWT_BEARER_GRANT,
            assertion: user_token,
            requested_token_use: "on_behalf_of",
            scope: &self.settings.scope,
        };

        let endpoint = self.settings.token_endpoint();
        debug!("Requesting OBO token from {}", endpoint);

        let response = self
            .client
            .post_form(&endpoint, &grant)
            .send()
            .await
            .map_err(|e| {
                error!("Error obtaining OBO token: {}", e);
                AuthExchangeError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Error obtaining OBO token: {} {}", status, body);
            return Err(AuthExchangeError::Rejected {
                status: status.as_u16(),
                detail: token_error_detail(&body),
            });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            error!("Error decoding OBO token response: {}", e);
            AuthExchangeError::MalformedResponse(e.to_string())
        })?;

        match body.access_token {
            Some(token) if !token.is_empty() => Ok(DelegatedToken::new(token)),
            _ => Err(AuthExchangeError::MalformedResponse(
                "no access_token in response".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_detail_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"AADSTS500133: Assertion is not within its valid time range."}"#;
        assert_eq!(
            token_error_detail(body),
            "AADSTS500133: Assertion is not within its valid time range."
        );
        assert_eq!(token_error_detail(r#"{"error":"invalid_client"}"#), "invalid_client");
        assert_eq!(token_error_detail("upstream down"), "upstream down");
        assert_eq!(token_error_detail(" "), "empty response body");
    }

    #[test]
    fn test_grant_form_encoding() {
        let grant = OboGrant {
            client_id: "cid",
            client_secret: "s&cret",
            grant_type: JWT_BEARER_GRANT,
            assertion: "user.jwt",
            requested_token_use: "on_behalf_of",
            scope: "https://graph.microsoft.com/.default",
        };
        let form = serde_urlencoded_like(&grant);
        assert!(form.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));
        assert!(form.contains("client_secret=s%26cret"));
        assert!(form.contains("requested_token_use=on_behalf_of"));
    }

    // Renders the form the same way reqwest does, via its url encoder.
    fn serde_urlencoded_like(grant: &OboGrant<'_>) -> String {
        let request = reqwest::Client::new()
            .post("http://localhost/token")
            .form(grant)
            .build()
            .unwrap();
        let bytes = request.body().and_then(|b| b.as_bytes()).unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}
