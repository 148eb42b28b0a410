//! Manual test harness for a locally running connector.
//!
//! Signs in through the browser, then calls the connector with the
//! resulting token and prints its reply.
//!
//! USAGE:
//!     AZURE_CLIENT_ID=... AZURE_TENANT_ID=... auth_harness [SEARCH_TERM]

use anyhow::{Context, Result};
use graph_file_search::harness::{self, HarnessConfig, CALLBACK_PORT};
use std::net::SocketAddr;
use std::process::Stdio;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let config = match HarnessConfig::from_vars(&std::env::vars().collect()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            println!("\nExample:");
            println!("export AZURE_CLIENT_ID=12345678-1234-1234-1234-123456789abc");
            println!("export AZURE_TENANT_ID=87654321-4321-4321-4321-cba987654321");
            std::process::exit(1);
        }
    };
    let search_term = std::env::args().nth(1).unwrap_or_else(|| "test".to_string());

    let addr = SocketAddr::from(([127, 0, 0, 1], CALLBACK_PORT));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("could not bind callback listener on {}", addr))?;
    info!("Callback server started on http://localhost:{}", CALLBACK_PORT);

    let authorize_url = config.authorize_url()?;
    println!("Auth URL: {}", authorize_url);
    open_browser(authorize_url.as_str());

    info!("Waiting for authentication...");
    let code = harness::wait_for_code(listener).await?;

    let client = reqwest::Client::builder()
        .user_agent(graph_file_search::network::user_agent())
        .build()?;
    let token = harness::exchange_code(&client, &config, &code).await?;
    info!("Access token obtained");

    info!("Testing connector with search term \"{}\"", search_term);
    info!("Connector URL: {}", config.function_url);
    match harness::call_function(&client, &config, &token, &search_term).await {
        Ok(reply) => {
            println!("Status: {}", reply.status);
            println!("Data: {}", reply.pretty_body());
        }
        Err(e) => {
            error!("Connector call failed: {:#}", e);
            if e.chain()
                .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
                .any(|e| e.is_connect())
            {
                println!("Tip: make sure the connector is running locally");
            }
        }
    }

    Ok(())
}

fn open_browser(url: &str) {
    let spawned = harness::browser_command(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();
    if spawned.is_err() {
        warn!("Could not open browser automatically, open the URL above manually");
    }
}
