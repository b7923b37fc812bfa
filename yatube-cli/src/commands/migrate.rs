//! Schema migration command

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;

use yatube_server::db::{create_pool, migrate};

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long)]
    pub database_url: Option<String>,
}

/// Apply the schema. Safe to run repeatedly.
pub async fn run_migrate(args: MigrateArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let database_url = args.database_url.unwrap_or(config.database_url);

    let pool = create_pool(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    migrate(&pool).await.context("Failed to apply schema")?;

    tracing::info!(database = %database_url, "schema up to date");
    println!("Schema applied to {database_url}");
    Ok(())
}
