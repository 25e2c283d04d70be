//! Outfit recommendation handler.

use anyhow::Result;

use crate::cli::output::{output_json_list, print_error, print_hint, print_table, OutputMode};
use crate::cli::resolve::resolve_product_by_name;
use crate::init::AppContext;
use crate::models::product::{get_product, Product};
use crate::VestraError;

pub async fn handle_recommend(
    ctx: &AppContext,
    product: &str,
    limit: usize,
    mode: OutputMode,
) -> Result<()> {
    if limit == 0 {
        anyhow::bail!("--limit must be at least 1");
    }

    let Some(query) = resolve_query_product(ctx, product).await? else {
        return Ok(());
    };

    let key = query.id.key().to_string();
    let results = match ctx.recommender.recommend(&key, limit).await {
        Ok(results) => results,
        Err(VestraError::MissingEmbedding { id }) => {
            anyhow::bail!(
                "Product '{}' has no style embedding yet. Run 'vestra embed' first.",
                id
            );
        }
        Err(e) => return Err(e.into()),
    };

    if mode == OutputMode::Json {
        output_json_list(&results);
        return Ok(());
    }

    println!(
        "Goes with '{}' ({}): {} results\n",
        query.name,
        query.category.as_deref().unwrap_or("uncategorized"),
        results.len()
    );

    let rows: Vec<Vec<String>> = results
        .iter()
        .map(|r| {
            vec![
                r.id.clone(),
                r.name.clone().unwrap_or_default(),
                r.category.clone().unwrap_or_default(),
                format!("{:.4}", r.score),
            ]
        })
        .collect();

    print_table(&["ID", "Name", "Category", "Score"], rows);

    if results.is_empty() {
        print_hint("Compatible products may be missing embeddings. Run 'vestra embed'.");
    }

    Ok(())
}

/// Resolve a CLI argument to a product, accepting an ID (bare key or
/// `product:key` form) or a name. Reports ambiguous or absent inputs itself
/// and returns `None`.
async fn resolve_query_product(ctx: &AppContext, input: &str) -> Result<Option<Product>> {
    if let Some(p) = get_product(&ctx.db, input).await? {
        return Ok(Some(p));
    }

    let matches = resolve_product_by_name(&ctx.db, input).await?;
    match matches.len() {
        0 => {
            print_error(&format!("No product matching '{}'", input));
            print_hint("Try: vestra list");
            Ok(None)
        }
        1 => Ok(get_product(&ctx.db, &matches[0].id).await?),
        _ => {
            print_error(&format!(
                "Multiple products named '{}'. Use a full ID:",
                input
            ));
            for m in &matches {
                println!("  product:{} ({})", m.id, m.name);
            }
            Ok(None)
        }
    }
}
