//! Search execution and content fan-out

use super::models::{FailurePolicy, FetchedFile, FileResponse, ItemError, ResponseEnvelope};
use crate::auth::DelegatedToken;
use crate::error::{ConnectorError, FetchError};
use crate::graph::{GraphClient, SearchHit};
use futures::future::{join_all, try_join_all};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// MIME type used when a file facet omits one
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Runs one search and retrieves every matching drive item
pub struct Search {
    graph: GraphClient,
    policy: FailurePolicy,
    fetch_timeout: Duration,
}

impl Search {
    /// Create a new search executor
    pub fn new(graph: GraphClient) -> Self {
        Self {
            graph,
            policy: FailurePolicy::FailFast,
            fetch_timeout: Duration::from_secs(120),
        }
    }

    /// Set the per-item failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound the whole content fan-out, and each download with it
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.graph = self.graph.with_download_timeout(timeout);
        self.fetch_timeout = timeout;
        self
    }

    /// Search for `term` and fetch every drive item hit.
    ///
    /// Files come back in hit order. Dropping the returned future drops
    /// every in-flight fetch.
    pub async fn run(
        &self,
        token: &DelegatedToken,
        term: &str,
    ) -> Result<ResponseEnvelope, ConnectorError> {
        let response = self.graph.search(token, term).await?;

        if response.has_no_results() {
            info!("No results for '{}'", term);
            return Ok(ResponseEnvelope::NoResults);
        }

        let hits = response.drive_item_hits();
        info!("Fetching {} drive items for '{}'", hits.len(), term);

        let fetches = hits.iter().map(|hit| self.fetch_file(token, hit));

        let files = match self.policy {
            FailurePolicy::FailFast => {
                let files = timeout(self.fetch_timeout, try_join_all(fetches))
                    .await
                    .map_err(|_| self.timeout_error())??;
                FileResponse::new(files)
            }
            FailurePolicy::Partial => {
                let outcomes = timeout(self.fetch_timeout, join_all(fetches))
                    .await
                    .map_err(|_| self.timeout_error())?;
                collect_partial(&hits, outcomes)
            }
        };

        debug!(
            "Returning {} files and {} item errors",
            files.files.len(),
            files.errors.len()
        );
        Ok(ResponseEnvelope::Files(files))
    }

    /// Retrieve one hit's content and metadata concurrently
    async fn fetch_file(
        &self,
        token: &DelegatedToken,
        hit: &SearchHit,
    ) -> Result<FetchedFile, FetchError> {
        let item = hit.drive_item()?;

        let (content, metadata) = tokio::try_join!(
            self.graph.download(token, &item),
            self.graph.metadata(token, &item)
        )?;

        let mime_type = match metadata.file {
            Some(file) => file
                .mime_type
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            None => return Err(FetchError::NotAFile { name: item.name }),
        };
        let name = metadata.name.unwrap_or(item.name);

        Ok(FetchedFile::from_bytes(name, mime_type, &content))
    }

    fn timeout_error(&self) -> FetchError {
        warn!("Content retrieval exceeded {:?}", self.fetch_timeout);
        FetchError::Timeout {
            secs: self.fetch_timeout.as_secs_f64(),
        }
    }
}

/// Split fetch outcomes into files and annotated errors, keeping hit order
fn collect_partial(
    hits: &[&SearchHit],
    outcomes: Vec<Result<FetchedFile, FetchError>>,
) -> FileResponse {
    let mut response = FileResponse::default();
    for (hit, outcome) in hits.iter().zip(outcomes) {
        match outcome {
            Ok(file) => response.files.push(file),
            Err(e) => {
                warn!("Skipping {}: {}", hit.display_name(), e);
                response.errors.push(ItemError {
                    name: e
                        .item_name()
                        .map(str::to_string)
                        .unwrap_or_else(|| hit.display_name()),
                    id: hit.resource.id.clone(),
                    message: e.to_string(),
                });
            }
        }
    }
    response
}
