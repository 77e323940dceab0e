//! Summer Camp CLI - migrations, admin bootstrap and gallery uploads.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! camp-cli migrate
//!
//! # Create admin user
//! camp-cli admin create -e admin@example.com -r admin
//!
//! # Upload a folder of photos, one collection per subfolder
//! camp-cli gallery upload ./photos --dry-run
//! camp-cli gallery upload ./photos --bucket gallery
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin create` - Create admin users
//! - `gallery upload` - Bulk upload gallery photos

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "camp-cli")]
#[command(author, version, about = "Summer Camp CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage the photo gallery
    Gallery {
        #[command(subcommand)]
        action: GalleryAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin role (`admin`, `subadmin`)
        #[arg(short, long, default_value = "subadmin")]
        role: String,
    },
}

#[derive(Subcommand)]
enum GalleryAction {
    /// Upload a folder tree; each first-level folder is a collection
    Upload {
        /// Root folder
        dir: PathBuf,

        /// Storage bucket (default: `SUPABASE_STORAGE_BUCKET` or `gallery`)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Print the plan without uploading anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camp_cli=info,summer_camp_data=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email, role } => {
                commands::admin::create_user(&email, &role).await?;
            }
        },
        Commands::Gallery { action } => match action {
            GalleryAction::Upload {
                dir,
                bucket,
                dry_run,
            } => {
                commands::gallery::upload(&dir, bucket, dry_run).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
