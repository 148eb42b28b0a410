//! HTTP client for calls to the identity provider and Microsoft Graph

use crate::config::OutgoingSettings;
use anyhow::Result;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

/// HTTP client wrapper with connector-specific configuration
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let timeout = Duration::from_secs_f64(settings.request_timeout);
        // Deadlines are set per request so content downloads can outlive
        // `request_timeout`.
        let mut builder = Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .user_agent(user_agent())
            .gzip(true)
            .brotli(true);

        // Proxy settings
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            default_timeout: timeout,
        })
    }

    /// POST an `application/x-www-form-urlencoded` body
    pub fn post_form<T: Serialize + ?Sized>(&self, url: &str, form: &T) -> RequestBuilder {
        self.client.post(url).form(form).timeout(self.default_timeout)
    }

    /// GET with a bearer token
    pub fn get_authorized(&self, url: &str, token: &str) -> RequestBuilder {
        self.get_authorized_with_timeout(url, token, self.default_timeout)
    }

    /// GET with a bearer token and a custom deadline covering the whole body
    pub fn get_authorized_with_timeout(
        &self,
        url: &str,
        token: &str,
        timeout: Duration,
    ) -> RequestBuilder {
        self.client.get(url).bearer_auth(token).timeout(timeout)
    }

    /// POST a JSON body with a bearer token
    pub fn post_json_authorized<T: Serialize + ?Sized>(
        &self,
        url: &str,
        token: &str,
        body: &T,
    ) -> RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .timeout(self.default_timeout)
    }

    /// Timeout applied to every call that does not set its own
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

/// User agent sent on every outgoing request
pub fn user_agent() -> String {
    format!("graph-file-search/{}", crate::VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_timeout_from_settings() {
        let settings = OutgoingSettings {
            request_timeout: 2.5,
            ..Default::default()
        };
        let client = HttpClient::with_settings(&settings).unwrap();
        assert_eq!(client.default_timeout(), Duration::from_millis(2500));
    }

    #[test]
    fn test_requests_carry_default_timeout() {
        let settings = OutgoingSettings {
            request_timeout: 4.0,
            ..Default::default()
        };
        let client = HttpClient::with_settings(&settings).unwrap();

        let request = client
            .post_json_authorized("http://localhost/search", "t", &serde_json::json!({}))
            .build()
            .unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_secs(4)));

        let request = client
            .get_authorized_with_timeout("http://localhost/content", "t", Duration::from_secs(90))
            .build()
            .unwrap();
        assert_eq!(request.timeout(), Some(&Duration::from_secs(90)));
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(user_agent().ends_with(crate::VERSION));
    }
}
