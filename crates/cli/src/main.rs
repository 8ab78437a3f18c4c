//! Coza CLI - Database migrations, catalog seeding and admin management.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! coza-cli migrate
//!
//! # Load the bundled preset catalog (or your own YAML file)
//! coza-cli seed products
//! coza-cli seed products --file catalog.yaml
//!
//! # Give an existing customer the admin role
//! coza-cli admin promote -e ops@example.com
//!
//! # Create a new admin with a temporary password
//! coza-cli admin create -e ops@example.com -n "Ops Team"
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "coza-cli")]
#[command(author, version, about = "Coza store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load data into the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Upsert products from a YAML file
    Products {
        /// YAML file to load; defaults to the bundled preset catalog
        #[arg(short, long)]
        file: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Give an existing user the admin role
    Promote {
        /// Email address of the user
        #[arg(short, long)]
        email: String,
    },
    /// Create a new admin user with a temporary password
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coza_cli=info,coza_admin=warn".into()),
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
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => {
                commands::seed::products(file.as_deref()).await?;
            }
        },
        Commands::Admin { action } => match action {
            AdminAction::Promote { email } => {
                commands::admin::promote(&email).await?;
            }
            AdminAction::Create { email, name } => {
                commands::admin::create_user(&email, &name).await?;
            }
        },
    }
    Ok(())
}
