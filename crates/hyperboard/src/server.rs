use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use hyperboard_logs::{LogStore, TreeWatcher};

use crate::api;
use crate::config::Settings;

pub async fn handle_serve(store: LogStore, settings: &Settings, open: bool) -> Result<()> {
    let watcher = match TreeWatcher::new(store.root_folder()) {
        Ok(watcher) => Some(Arc::new(watcher)),
        Err(e) => {
            warn!(
                root = %store.root_folder().display(),
                error = %e,
                "Could not watch root folder; live updates disabled"
            );
            None
        }
    };

    let router = api::create_router(Arc::new(store), watcher);

    let addr = settings.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind server to {}", addr))?;
    let local = listener
        .local_addr()
        .context("Failed to read listener address")?;
    info!(%local, "Hyperboard listening");

    let url = format!("http://{}/api/dashboard", local);
    eprintln!();
    eprintln!("  {} {}", "->".bright_green(), format!("Serving {}", url).bold());
    eprintln!("  {} Press {} to stop", "->".dimmed(), "Ctrl+C".bold());
    eprintln!();

    if open {
        if let Err(e) = open::that(&url) {
            eprintln!("Failed to open browser: {} (open {} manually)", e, url);
        }
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    eprintln!("\nShutting down...");
}
