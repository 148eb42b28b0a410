//! graph-file-search: HTTP entry point

use anyhow::{Context, Result};
use graph_file_search::{
    config::Settings,
    network::HttpClient,
    web::{create_router, AppState, CONNECTOR_PATH},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting graph-file-search v{}", graph_file_search::VERSION);

    // Load configuration
    let settings = load_settings()?;
    settings.validate().context("invalid configuration")?;
    info!(
        "Loaded configuration for tenant {} (partial results: {})",
        settings.auth.tenant_id, settings.search.partial_results
    );

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.outgoing)?;
    info!("HTTP client initialized");

    let addr = SocketAddr::new(settings.server.bind_address.parse()?, settings.server.port);

    let state = AppState::new(settings, client);
    let app = create_router(state);

    info!("Serving http://{}{}", addr, CONNECTOR_PATH);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Load settings from file or use defaults, then apply the environment
fn load_settings() -> Result<Settings> {
    let paths = [
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/graph-file-search/settings.yml"),
        dirs::config_dir()
            .map(|p| p.join("graph-file-search/settings.yml"))
            .unwrap_or_default(),
    ];

    // Check environment variable first
    if let Ok(path) = std::env::var("GRAPH_CONNECTOR_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    for path in paths.iter() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults and environment");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}
