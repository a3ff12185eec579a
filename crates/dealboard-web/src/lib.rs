//! dealboard-web - HTTP API for dealboard using Axum

pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::create_router;

use anyhow::{Context, Result};
use dealboard_core::Orchestrator;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared handler state
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    /// Include internal error detail in responses
    pub debug: bool,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>, debug: bool) -> Self {
        Self {
            orchestrator,
            debug,
        }
    }
}

/// Run the web server on `addr` (`host:port`)
pub async fn run(state: Arc<AppState>, addr: &str) -> Result<()> {
    let router = create_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener.local_addr()?;

    info!(addr = %local, "Web server listening");
    println!("dealboard API listening on http://{}", local);

    axum::serve(listener, router).await?;

    Ok(())
}
