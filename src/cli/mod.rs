//! CLI interface for Vestra.

pub mod handlers;
pub mod output;
pub mod resolve;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;

use output::OutputMode;

/// Vestra - Outfit compatibility engine for clothing catalogs
#[derive(Parser)]
#[command(name = "vestra", version, about, long_about = None)]
pub struct Cli {
    /// Override data directory (default: ~/.vestra)
    #[arg(long, env = "VESTRA_DATA_PATH", global = true)]
    pub data_path: Option<PathBuf>,

    /// Output as JSON instead of human-readable format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Recommend outfit-compatible products for a catalog product
    Recommend {
        /// Product ID (bare key or product:key) or product name
        product: String,
        /// Maximum recommendations
        #[arg(long, default_value = "5")]
        limit: usize,
    },

    /// Fuse style embeddings for products missing one
    Embed {
        /// Re-embed products that already have an embedding
        #[arg(long)]
        force: bool,
        /// Restrict the run to one category
        #[arg(long)]
        category: Option<String>,
        /// Maximum products to process
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Import scraped products from a YAML file
    Import {
        /// Path to YAML import file
        #[arg(long)]
        file: PathBuf,
        /// Parse and show counts without writing to the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// List catalog products
    List {
        /// Filter by category
        #[arg(long)]
        category: Option<String>,
        /// Maximum results
        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Get a product by ID or name
    Get {
        /// Product ID (bare key or product:key) or name for auto-resolution
        product: String,
    },

    /// Catalog overview (product counts, embedding coverage, encoder)
    Status,

    /// Show the active outfit compatibility rules
    Rules {
        /// Show targets for one category only
        #[arg(long)]
        category: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, elvish, powershell)
        shell: clap_complete::Shell,
    },
}

/// Execute a CLI command, dispatching to the appropriate handler.
pub async fn execute(
    command: &Commands,
    ctx: &crate::init::AppContext,
    mode: OutputMode,
) -> anyhow::Result<()> {
    match command {
        Commands::Recommend { product, limit } => {
            handlers::recommend::handle_recommend(ctx, product, *limit, mode).await?
        }

        Commands::Embed {
            force,
            category,
            limit,
        } => handlers::embed::handle_embed(ctx, *force, category.as_deref(), *limit, mode).await?,

        Commands::Import { file, dry_run } => {
            handlers::catalog::handle_import(ctx, file, *dry_run, mode).await?
        }

        Commands::List { category, limit } => {
            handlers::catalog::handle_list(ctx, category.as_deref(), *limit, mode).await?
        }

        Commands::Get { product } => handlers::catalog::handle_get(ctx, product, mode).await?,

        Commands::Status => handlers::status::handle_status(ctx, mode).await?,

        Commands::Rules { category } => {
            handlers::rules::handle_rules(ctx, category.as_deref(), mode).await?
        }

        // Shell completions (no AppContext needed, but we have it here)
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "vestra", &mut std::io::stdout());
        }
    }

    Ok(())
}
