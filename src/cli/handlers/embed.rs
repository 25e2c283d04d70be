//! Embedding fusion handler.

use anyhow::Result;

use crate::cli::output::{create_spinner, output_json, OutputMode};
use crate::embedding::{create_style_encoder, FusionOptions, FusionService};
use crate::init::AppContext;

pub async fn handle_embed(
    ctx: &AppContext,
    force: bool,
    category: Option<&str>,
    limit: Option<usize>,
    mode: OutputMode,
) -> Result<()> {
    // The encoder downloads and loads model weights on first use; keep that
    // off the async runtime.
    let spinner = create_spinner("Loading style encoder...");
    let config = ctx.encoder_config.clone();
    let encoder = tokio::task::spawn_blocking(move || create_style_encoder(&config))
        .await
        .map_err(|e| anyhow::anyhow!("Encoder load task failed: {}", e))??;
    spinner.finish_and_clear();

    let options = FusionOptions {
        force,
        category: category.map(str::to_string),
        limit,
    };

    let spinner = create_spinner("Fusing style embeddings...");
    let fusion = FusionService::new(ctx.db.clone(), encoder)?;
    let stats = fusion.run(options).await?;
    spinner.finish_and_clear();

    if mode == OutputMode::Json {
        output_json(&stats);
        return Ok(());
    }

    println!("\nFusion complete:");
    println!("  Total products: {}", stats.total_products);
    println!("  Embedded:       {}", stats.embedded);
    println!("  Failed:         {}", stats.failed);
    if !stats.category_stats.is_empty() {
        println!("  By category:");
        for (category, count) in &stats.category_stats {
            println!("    {}: {}", category, count);
        }
    }

    if stats.embedded > 0 {
        println!("\nRun 'vestra recommend <product>' to get outfit matches.");
    }

    Ok(())
}
