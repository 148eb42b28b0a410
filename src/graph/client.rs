//! Thin Microsoft Graph REST client

use super::models::{error_detail, DriveItem, DriveItemRef, SearchRequest, SearchResponse};
use crate::auth::DelegatedToken;
use crate::error::{FetchError, SearchError};
use crate::network::HttpClient;
use futures::StreamExt;
use std::time::Duration;
use tracing::{debug, error};

/// Upper bound on buffer space reserved from a Content-Length header
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Graph client bound to one API root
#[derive(Clone)]
pub struct GraphClient {
    http: HttpClient,
    base_url: String,
    download_timeout: Duration,
}

impl GraphClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            download_timeout: Duration::from_secs(120),
        }
    }

    /// Deadline for a whole content download, body included
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Run a one-page drive item search
    pub async fn search(
        &self,
        token: &DelegatedToken,
        term: &str,
    ) -> Result<SearchResponse, SearchError> {
        let url = format!("{}/search/query", self.base_url);
        let response = self
            .http
            .post_json_authorized(&url, token.secret(), &SearchRequest::drive_items(term))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Search query failed: {} {}", status, body);
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!("Undecodable search response: {}", e);
            SearchError::Decode(e.to_string())
        })
    }

    /// Download an item's content, concatenating the streamed chunks
    pub async fn download(
        &self,
        token: &DelegatedToken,
        item: &DriveItemRef,
    ) -> Result<Vec<u8>, FetchError> {
        let url = format!("{}/content", self.item_url(item));
        let response = self
            .http
            .get_authorized_with_timeout(&url, token.secret(), self.download_timeout)
            .send()
            .await
            .map_err(|e| transport(item, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream(item, status, response).await);
        }

        let expected = response.content_length().unwrap_or(0).min(MAX_PREALLOC);
        let mut content = Vec::with_capacity(expected as usize);
        let mut stream = response.bytes_stream();
        let mut chunks = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transport(item, e))?;
            content.extend_from_slice(&chunk);
            chunks += 1;
        }

        debug!(
            "Downloaded {} bytes in {} chunks for {}",
            content.len(),
            chunks,
            item.name
        );
        Ok(content)
    }

    /// Fetch an item's metadata
    pub async fn metadata(
        &self,
        token: &DelegatedToken,
        item: &DriveItemRef,
    ) -> Result<DriveItem, FetchError> {
        let response = self
            .http
            .get_authorized(&self.item_url(item), token.secret())
            .send()
            .await
            .map_err(|e| transport(item, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(upstream(item, status, response).await);
        }

        response.json().await.map_err(|e| transport(item, e))
    }

    fn item_url(&self, item: &DriveItemRef) -> String {
        format!(
            "{}/drives/{}/items/{}",
            self.base_url,
            urlencoding::encode(&item.drive_id),
            urlencoding::encode(&item.item_id)
        )
    }
}

fn transport(item: &DriveItemRef, source: reqwest::Error) -> FetchError {
    error!("Error fetching drive content for {}: {}", item.name, source);
    FetchError::Transport {
        name: item.name.clone(),
        source,
    }
}

async fn upstream(
    item: &DriveItemRef,
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> FetchError {
    let body = response.text().await.unwrap_or_default();
    error!(
        "Error fetching drive content for {}: {} {}",
        item.name, status, body
    );
    FetchError::Upstream {
        name: item.name.clone(),
        status: status.as_u16(),
        detail: error_detail(&body),
    }
}
