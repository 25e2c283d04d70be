//! Catalog status handler.

use anyhow::Result;
use colored::Colorize;

use crate::cli::output::{output_json, print_table, OutputMode};
use crate::db::connection::ping;
use crate::embedding::provider::EncoderMatch;
use crate::init::AppContext;
use crate::services::status::collect_catalog_stats;

pub async fn handle_status(ctx: &AppContext, mode: OutputMode) -> Result<()> {
    // Readiness first: a remote catalog can drop after startup.
    ping(&ctx.db).await?;
    let stats = collect_catalog_stats(&ctx.db).await?;

    if mode == OutputMode::Json {
        let json = serde_json::json!({
            "data_path": ctx.data_path.display().to_string(),
            "total_products": stats.total_products,
            "embedded": stats.embedded,
            "coverage_percent": stats.coverage_percent(),
            "categories": stats.categories,
            "encoder": stats.encoder,
            "configured_encoder": ctx.encoder_config.model_id(),
            "encoder_mismatch": matches!(ctx.encoder_match, EncoderMatch::Mismatch { .. }),
        });
        output_json(&json);
        return Ok(());
    }

    println!("{}", format!("Catalog: {}", ctx.data_path.display()).bold());
    println!();

    let rows: Vec<Vec<String>> = stats
        .categories
        .iter()
        .map(|c| {
            let coverage = if c.total > 0 {
                format!("{:.0}%", (c.embedded as f64 / c.total as f64) * 100.0)
            } else {
                "-".to_string()
            };
            vec![
                c.category.clone(),
                c.total.to_string(),
                c.embedded.to_string(),
                coverage,
            ]
        })
        .collect();

    print_table(&["Category", "Products", "Embedded", "Coverage"], rows);

    println!();
    let coverage = stats
        .coverage_percent()
        .map(|p| format!("{:.0}%", p))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  Total: {} products, {} embedded ({})",
        stats.total_products, stats.embedded, coverage
    );

    match (&stats.encoder, &ctx.encoder_match) {
        (Some(meta), EncoderMatch::Match) => println!(
            "  Encoder: {} ({} dims) {}",
            meta.encoder_model,
            meta.dimensions,
            "OK".green()
        ),
        (Some(meta), _) => println!(
            "  Encoder: {} ({} dims)",
            meta.encoder_model, meta.dimensions
        ),
        (None, _) => println!(
            "  Encoder: {} {}",
            "none recorded".yellow(),
            "(run 'vestra embed' to fuse embeddings)".dimmed()
        ),
    }

    if let EncoderMatch::Mismatch {
        stored_model,
        current_model,
        ..
    } = &ctx.encoder_match
    {
        println!(
            "  {} Encoder mismatch: catalog embedded with '{}', current is '{}'",
            "WARNING:".yellow().bold(),
            stored_model,
            current_model
        );
        println!("  {}", "Run 'vestra embed --force' to re-embed.".dimmed());
    }

    Ok(())
}
