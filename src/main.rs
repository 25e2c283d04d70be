//! Vestra - Outfit compatibility engine for clothing catalogs
//!
//! Usage:
//!   vestra recommend <id_or_name>  What goes with this product
//!   vestra embed                   Fuse style embeddings for the catalog
//!   vestra import --file x.yaml    Ingest scraped products
//!   vestra list                    List catalog products
//!   vestra status                  Catalog overview dashboard
//!   vestra --help                  Show all commands

use anyhow::Result;
use clap::Parser;

use vestra::cli::output::OutputMode;
use vestra::cli::Cli;
use vestra::init::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Tracing to stderr so stdout stays clean for --json consumers
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vestra=info".parse()?),
        )
        .init();

    let mode = OutputMode::from_json_flag(cli.json);

    let ctx = AppContext::new(cli.data_path.clone()).await?;
    vestra::cli::execute(&cli.command, &ctx, mode).await?;

    Ok(())
}
