//! Application state shared across handlers

use crate::auth::{OboTokenExchanger, TokenExchanger};
use crate::config::Settings;
use crate::graph::GraphClient;
use crate::network::HttpClient;
use crate::search::{FailurePolicy, Search};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// On-behalf-of token exchanger
    pub exchanger: Arc<dyn TokenExchanger>,
    /// Search executor
    pub search: Arc<Search>,
}

impl AppState {
    /// Create application state wired to the configured identity provider
    /// and Graph endpoint
    pub fn new(settings: Settings, client: HttpClient) -> Self {
        let exchanger = OboTokenExchanger::new(client.clone(), settings.auth.clone());
        Self::with_exchanger(settings, client, Arc::new(exchanger))
    }

    /// Create application state with a custom token exchanger
    pub fn with_exchanger(
        settings: Settings,
        client: HttpClient,
        exchanger: Arc<dyn TokenExchanger>,
    ) -> Self {
        let graph = GraphClient::new(client, settings.graph.base_url.clone());
        let search = Search::new(graph)
            .with_policy(FailurePolicy::from_partial_results(
                settings.search.partial_results,
            ))
            .with_fetch_timeout(Duration::from_secs_f64(settings.outgoing.fetch_timeout));

        Self {
            exchanger,
            search: Arc::new(search),
        }
    }
}
