//! Community group administration

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use yatube_server::db::{create_pool, migrate, GroupRepo};
use yatube_server::models::{GroupSlug, GroupTitle};

#[derive(Parser, Debug)]
pub struct GroupArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand, Debug)]
pub enum GroupCommand {
    /// Create a group
    Create {
        /// URL slug, e.g. `cats` for /group/cats/
        #[arg(long)]
        slug: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Free-form description
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all groups
    List,
    /// Delete a group; its posts stay, without a group
    Delete {
        /// Slug of the group to delete
        slug: String,
    },
}

pub async fn run_group(args: GroupArgs, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let database_url = args.database_url.unwrap_or(config.database_url);

    let pool = create_pool(&database_url)
        .await
        .with_context(|| format!("Failed to open database {database_url}"))?;
    migrate(&pool).await.context("Failed to apply schema")?;
    let groups = GroupRepo::new(&pool);

    match args.command {
        GroupCommand::Create {
            slug,
            title,
            description,
        } => {
            let slug = GroupSlug::new(&slug).context("Invalid slug")?;
            let title = GroupTitle::new(&title).context("Invalid title")?;
            let group = groups
                .create(&slug, &title, description.trim())
                .await
                .context("Failed to create group")?;
            println!("Created group '{}' at /group/{}/", group.title, group.slug);
        }
        GroupCommand::List => {
            let all = groups.list().await.context("Failed to list groups")?;
            if all.is_empty() {
                println!("No groups yet");
            }
            for group in all {
                println!("{:<24} {}", group.slug, group.title);
            }
        }
        GroupCommand::Delete { slug } => {
            groups
                .delete(&slug)
                .await
                .with_context(|| format!("Failed to delete group '{slug}'"))?;
            println!("Deleted group '{slug}'");
        }
    }

    Ok(())
}
