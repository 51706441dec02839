pub mod cli;
pub mod error;
pub mod models;
pub mod relay;
pub mod server;
pub mod session;
pub mod store;

use cli::Args;
use log::{info, warn};
use server::{AppState, Server};
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Assistant Base URL: {}", args.assistant_base_url);
    info!(
        "Assistant API Key Configured: {}",
        args.assistant_api_key.as_deref().map(|k| !k.is_empty()).unwrap_or(false)
    );
    info!("Default User Id: {}", args.default_user_id);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let state = AppState::from_args(&args)?;
    if state.upstream.is_none() {
        warn!("ASSISTANT_API_KEY is not set; chat requests will be rejected until it is configured");
    }

    let addr = args.server_addr.clone();
    let server = Server::new(addr, state, args);
    server.run().await?;

    Ok(())
}
