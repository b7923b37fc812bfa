//! HTTP server command

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use yatube_server::run_server;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Directory for uploaded images
    #[arg(long)]
    pub media_root: Option<PathBuf>,

    /// Seconds the index page stays cached (0 disables the cache)
    #[arg(long)]
    pub cache_ttl: Option<u64>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = super::load_config(config_path)?;

    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.database_url = url;
    }
    if let Some(root) = args.media_root {
        config.media_root = root;
    }
    if let Some(ttl) = args.cache_ttl {
        config.index_cache_ttl_secs = ttl;
    }

    tracing::info!("Starting yatube on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(config).await.context("Server error")?;

    Ok(())
}
