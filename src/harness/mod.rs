//! Manual end-to-end harness
//!
//! Signs a developer in through the browser (authorization code flow with a
//! local callback listener), then calls a running connector with the
//! resulting token. Used by the `auth_harness` binary; not part of the
//! service.

use crate::auth::token_error_detail;
use anyhow::{anyhow, bail, Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info};
use url::Url;

/// Port of the local callback listener
pub const CALLBACK_PORT: u16 = 3000;

/// Path the identity provider redirects to
pub const CALLBACK_PATH: &str = "/auth/callback";

/// Delegated scopes requested for the developer's token
pub const DEFAULT_SCOPES: [&str; 2] = [
    "https://graph.microsoft.com/Files.Read.All",
    "https://graph.microsoft.com/Sites.Read.All",
];

/// Timeout for the call to the connector
pub const FUNCTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub authority_host: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub function_url: String,
}

impl HarnessConfig {
    /// Read from `AZURE_CLIENT_ID`, `AZURE_TENANT_ID` and `FUNCTION_URL`
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let client_id = vars.get("AZURE_CLIENT_ID").filter(|v| !v.is_empty());
        let tenant_id = vars.get("AZURE_TENANT_ID").filter(|v| !v.is_empty());
        let (Some(client_id), Some(tenant_id)) = (client_id, tenant_id) else {
            bail!("please set AZURE_CLIENT_ID and AZURE_TENANT_ID environment variables");
        };

        Ok(Self {
            client_id: client_id.clone(),
            tenant_id: tenant_id.clone(),
            authority_host: "https://login.microsoftonline.com".to_string(),
            redirect_uri: format!("http://localhost:{}{}", CALLBACK_PORT, CALLBACK_PATH),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            function_url: vars
                .get("FUNCTION_URL")
                .cloned()
                .unwrap_or_else(|| "http://localhost:7071/api/msGraphConnector".to_string()),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/{}",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id,
            name
        )
    }

    /// Browser URL that starts the sign-in
    pub fn authorize_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint("authorize"))?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("response_mode", "query")
            .append_pair("prompt", "select_account");
        Ok(url)
    }

    /// Token endpoint for the code exchange
    pub fn token_url(&self) -> String {
        self.endpoint("token")
    }
}

/// What the identity provider sent to the callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Code(String),
    Error {
        error: String,
        description: Option<String>,
    },
    MissingCode,
}

impl CallbackOutcome {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        if let Some(error) = params.get("error") {
            return CallbackOutcome::Error {
                error: error.clone(),
                description: params.get("error_description").cloned(),
            };
        }
        match params.get("code") {
            Some(code) if !code.is_empty() => CallbackOutcome::Code(code.clone()),
            _ => CallbackOutcome::MissingCode,
        }
    }
}

type CodeSlot = Arc<Mutex<Option<oneshot::Sender<Result<String, String>>>>>;

/// Router for the local callback listener; the first callback resolves `tx`
pub fn callback_router(tx: oneshot::Sender<Result<String, String>>) -> Router {
    let slot: CodeSlot = Arc::new(Mutex::new(Some(tx)));
    Router::new()
        .route(CALLBACK_PATH, get(callback))
        .fallback(not_found)
        .with_state(slot)
}

async fn callback(
    State(slot): State<CodeSlot>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let (status, page, outcome) = match CallbackOutcome::from_params(&params) {
        CallbackOutcome::Code(code) => (
            StatusCode::OK,
            "<h1>Authentication Successful!</h1><p>You can close this window and return to the terminal.</p>".to_string(),
            Ok(code),
        ),
        CallbackOutcome::Error { error, description } => (
            StatusCode::BAD_REQUEST,
            format!(
                "<h1>Authentication Error</h1><p>{}: {}</p>",
                escape_html(&error),
                escape_html(description.as_deref().unwrap_or(""))
            ),
            Err(format!("Authentication error: {}", error)),
        ),
        CallbackOutcome::MissingCode => (
            StatusCode::BAD_REQUEST,
            "<h1>Authentication Error</h1><p>No authorization code received</p>".to_string(),
            Err("No authorization code received".to_string()),
        ),
    };

    if let Some(tx) = slot.lock().ok().and_then(|mut guard| guard.take()) {
        let _ = tx.send(outcome);
    }

    (status, Html(page)).into_response()
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Serve the callback router on `listener` until the first callback arrives
pub async fn wait_for_code(listener: TcpListener) -> Result<String> {
    let (tx, rx) = oneshot::channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let router = callback_router(tx);
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let outcome = rx.await.context("callback listener stopped")?;
    let _ = shutdown_tx.send(());
    if tokio::time::timeout(Duration::from_secs(5), server).await.is_err() {
        debug!("Callback listener did not stop in time");
    }

    outcome.map_err(|e| anyhow!(e))
}

#[derive(Deserialize)]
struct CodeTokenResponse {
    access_token: Option<String>,
}

/// Exchange an authorization code for an access token
pub async fn exchange_code(
    client: &reqwest::Client,
    config: &HarnessConfig,
    code: &str,
) -> Result<String> {
    let scope = config.scopes.join(" ");
    let params = [
        ("client_id", config.client_id.as_str()),
        ("scope", scope.as_str()),
        ("code", code),
        ("redirect_uri", config.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    info!("Exchanging authorization code for access token");
    let response = client
        .post(config.token_url())
        .form(&params)
        .send()
        .await
        .context("token endpoint unreachable")?;

    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        bail!(
            "error getting access token: {} {}",
            status,
            token_error_detail(&body)
        );
    }

    serde_json::from_str::<CodeTokenResponse>(&body)?
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("token response has no access_token"))
}

/// Status and body of a connector call
#[derive(Debug)]
pub struct FunctionReply {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl FunctionReply {
    /// The body pretty-printed if it is JSON, verbatim otherwise
    pub fn pretty_body(&self) -> String {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| self.body.clone())
    }
}

/// POST `{searchTerm}` to the connector with the bearer token
pub async fn call_function(
    client: &reqwest::Client,
    config: &HarnessConfig,
    token: &str,
    search_term: &str,
) -> Result<FunctionReply> {
    let response = client
        .post(&config.function_url)
        .bearer_auth(token)
        .json(&serde_json::json!({ "searchTerm": search_term }))
        .timeout(FUNCTION_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("could not reach {}", config.function_url))?;

    Ok(FunctionReply {
        status: response.status(),
        body: response.text().await?,
    })
}

/// Command that opens `url` in the platform's browser.
///
/// `start` is a `cmd` builtin on Windows; its first quoted argument is the
/// window title, hence the empty one.
pub fn browser_command(url: &str) -> Command {
    let mut command = if cfg!(target_os = "windows") {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    } else if cfg!(target_os = "macos") {
        Command::new("open")
    } else {
        Command::new("xdg-open")
    };
    command.arg(url);
    command
}
