//! Settings structures for graph-file-search configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching `settings.yml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub graph: GraphSettings,
    pub outgoing: OutgoingSettings,
    pub search: SearchSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with the process environment
    pub fn merge_env(&mut self) {
        self.merge_vars(std::env::vars().collect());
    }

    /// Merge with an explicit variable map.
    ///
    /// Credential variable names follow the function host's app settings
    /// (`TENANT_ID`, `CLIENT_ID`, `MICROSOFT_PROVIDER_AUTHENTICATION_SECRET`).
    pub fn merge_vars(&mut self, vars: HashMap<String, String>) {
        if let Some(val) = vars.get("TENANT_ID") {
            self.auth.tenant_id = val.clone();
        }
        if let Some(val) = vars.get("CLIENT_ID") {
            self.auth.client_id = val.clone();
        }
        if let Some(val) = vars.get("MICROSOFT_PROVIDER_AUTHENTICATION_SECRET") {
            self.auth.client_secret = val.clone();
        }
        if let Some(val) = vars.get("GRAPH_CONNECTOR_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = vars.get("GRAPH_CONNECTOR_BIND_ADDRESS") {
            self.server.bind_address = val.clone();
        }
        if let Some(val) = vars.get("GRAPH_CONNECTOR_PARTIAL_RESULTS") {
            self.search.partial_results = val.parse().unwrap_or(false);
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.tenant_id.trim().is_empty() {
            bail!("auth.tenant_id is not set (TENANT_ID)");
        }
        if self.auth.client_id.trim().is_empty() {
            bail!("auth.client_id is not set (CLIENT_ID)");
        }
        if self.auth.client_secret.is_empty() {
            bail!("auth.client_secret is not set (MICROSOFT_PROVIDER_AUTHENTICATION_SECRET)");
        }
        if !is_valid_timeout(self.outgoing.request_timeout) {
            bail!("outgoing.request_timeout must be a positive number of seconds");
        }
        if !is_valid_timeout(self.outgoing.fetch_timeout) {
            bail!("outgoing.fetch_timeout must be a positive number of seconds");
        }
        Ok(())
    }
}

/// Positive, finite and small enough to become a `Duration`
fn is_valid_timeout(secs: f64) -> bool {
    secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 7071,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Identity provider settings for the on-behalf-of exchange
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    /// Directory (tenant) identifier
    pub tenant_id: String,
    /// Application (client) identifier
    pub client_id: String,
    /// Client secret
    pub client_secret: String,
    /// Identity provider host, without tenant
    pub authority_host: String,
    /// Scope requested for the delegated token
    pub scope: String,
}

impl AuthSettings {
    /// Token endpoint for the configured tenant
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.tenant_id
        )
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            authority_host: "https://login.microsoftonline.com".to_string(),
            scope: "https://graph.microsoft.com/.default".to_string(),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("authority_host", &self.authority_host)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Microsoft Graph settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Graph API root, including version segment
    pub base_url: String,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Per-request timeout in seconds
    pub request_timeout: f64,
    /// Bound on the whole content fan-out for one request, in seconds
    pub fetch_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            fetch_timeout: 120.0,
            pool_maxsize: 20,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Search behavior settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Return successfully fetched files alongside per-item errors instead
    /// of failing the whole request on the first fetch error
    pub partial_results: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 7071);
        assert!(!settings.search.partial_results);
        assert_eq!(settings.graph.base_url, "https://graph.microsoft.com/v1.0");
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_merge_vars_fills_credentials() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[
            ("TENANT_ID", "tenant"),
            ("CLIENT_ID", "client"),
            ("MICROSOFT_PROVIDER_AUTHENTICATION_SECRET", "secret"),
            ("GRAPH_CONNECTOR_PORT", "8080"),
            ("GRAPH_CONNECTOR_PARTIAL_RESULTS", "true"),
        ]));

        assert_eq!(settings.auth.tenant_id, "tenant");
        assert_eq!(settings.auth.client_id, "client");
        assert_eq!(settings.auth.client_secret, "secret");
        assert_eq!(settings.server.port, 8080);
        assert!(settings.search.partial_results);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_port_is_ignored() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[("GRAPH_CONNECTOR_PORT", "not-a-port")]));
        assert_eq!(settings.server.port, 7071);
    }

    #[test]
    fn test_token_endpoint() {
        let auth = AuthSettings {
            tenant_id: "contoso".to_string(),
            authority_host: "https://login.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            auth.token_endpoint(),
            "https://login.example.com/contoso/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = AuthSettings {
            client_secret: "hunter2".to_string(),
            ..Default::default()
        };
        assert!(!format!("{:?}", auth).contains("hunter2"));
    }

    #[test]
    fn test_yaml_sections_default_independently() {
        let yaml = "auth:\n  tenant_id: t\n  client_id: c\n  client_secret: s\nsearch:\n  partial_results: true\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.auth.tenant_id, "t");
        assert_eq!(settings.auth.scope, "https://graph.microsoft.com/.default");
        assert!(settings.search.partial_results);
        assert_eq!(settings.outgoing.fetch_timeout, 120.0);
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[
            ("TENANT_ID", "t"),
            ("CLIENT_ID", "c"),
            ("MICROSOFT_PROVIDER_AUTHENTICATION_SECRET", "s"),
        ]));
        settings.outgoing.fetch_timeout = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_non_finite_timeout_rejected() {
        let mut settings = Settings::default();
        settings.merge_vars(vars(&[
            ("TENANT_ID", "t"),
            ("CLIENT_ID", "c"),
            ("MICROSOFT_PROVIDER_AUTHENTICATION_SECRET", "s"),
        ]));
        assert!(settings.validate().is_ok());

        for bad in [f64::NAN, f64::INFINITY, 1e30] {
            let mut s = settings.clone();
            s.outgoing.request_timeout = bad;
            assert!(s.validate().is_err(), "request_timeout {} accepted", bad);

            let mut s = settings.clone();
            s.outgoing.fetch_timeout = bad;
            assert!(s.validate().is_err(), "fetch_timeout {} accepted", bad);
        }
    }
}
