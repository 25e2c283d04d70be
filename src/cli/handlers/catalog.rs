//! Catalog handlers: import scraped products, list, and inspect.

use std::path::Path;

use serde::Deserialize;

use crate::cli::output::{
    output_json, output_json_list, print_error, print_header, print_hint, print_kv, print_success,
    print_table, OutputMode,
};
use crate::cli::resolve::resolve_product_by_name;
use crate::init::AppContext;
use crate::models::product::{
    get_product, ingest_product, list_products, IngestOutcome, Product, ProductCreate,
};

/// Import file layout: a `products` list of scraped records.
#[derive(Debug, Deserialize)]
struct ImportFile {
    #[serde(default)]
    products: Vec<ImportProduct>,
}

/// One scraped product: stable catalog id plus the scraped fields.
#[derive(Debug, Deserialize)]
struct ImportProduct {
    id: String,
    #[serde(flatten)]
    fields: ProductCreate,
}

pub async fn handle_import(
    ctx: &AppContext,
    file: &Path,
    dry_run: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file.display(), e))?;

    let import: ImportFile = serde_yaml_ng::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse YAML: {}", e))?;

    if dry_run {
        if mode == OutputMode::Json {
            output_json(&serde_json::json!({
                "dry_run": true,
                "products": import.products.len(),
            }));
        } else {
            println!("Dry run — no changes will be made\n");
            println!("Products in file: {}", import.products.len());
        }
        return Ok(());
    }

    let mut created = 0usize;
    let mut updated = 0usize;
    let mut unchanged = 0usize;
    let mut errors: Vec<String> = Vec::new();

    for record in import.products {
        if record.id.trim().is_empty() {
            errors.push(format!(
                "Product '{}' has no id; skipped",
                record.fields.name
            ));
            continue;
        }
        if record.fields.name.trim().is_empty() {
            errors.push(format!("Product '{}' has no name; skipped", record.id));
            continue;
        }

        match ingest_product(&ctx.db, &record.id, record.fields).await {
            Ok(IngestOutcome::Created) => created += 1,
            Ok(IngestOutcome::Updated) => updated += 1,
            Ok(IngestOutcome::Unchanged) => unchanged += 1,
            Err(e) => errors.push(format!("[{}] {}", record.id, e)),
        }
    }

    if mode == OutputMode::Json {
        output_json(&serde_json::json!({
            "created": created,
            "updated": updated,
            "unchanged": unchanged,
            "errors": errors,
        }));
        return Ok(());
    }

    print_success(&format!(
        "Import complete: {} created, {} updated, {} unchanged, {} errors",
        created,
        updated,
        unchanged,
        errors.len()
    ));

    for err in &errors {
        print_error(err);
    }

    if created + updated > 0 {
        println!("\nRun 'vestra embed' to generate style embeddings for imported products.");
    }

    Ok(())
}

pub async fn handle_list(
    ctx: &AppContext,
    category: Option<&str>,
    limit: usize,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let products = list_products(&ctx.db, category.map(str::to_string), limit).await?;

    if mode == OutputMode::Json {
        output_json_list(&products);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = products
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.clone(),
                p.category.clone().unwrap_or_default(),
                p.brand.clone().unwrap_or_default(),
                if p.embedded_at.is_some() {
                    "yes".to_string()
                } else {
                    "-".to_string()
                },
            ]
        })
        .collect();

    print_table(&["ID", "Name", "Category", "Brand", "Embedded"], rows);
    Ok(())
}

pub async fn handle_get(ctx: &AppContext, input: &str, mode: OutputMode) -> anyhow::Result<()> {
    // Explicit ID first (bare key or product:key), then name resolution.
    if let Some(product) = get_product(&ctx.db, input).await? {
        print_product(&product, mode);
        return Ok(());
    }

    let matches = resolve_product_by_name(&ctx.db, input).await?;
    match matches.len() {
        0 => {
            print_error(&format!("No product matching '{}'", input));
            print_hint("Try: vestra list");
        }
        1 => match get_product(&ctx.db, &matches[0].id).await? {
            Some(product) => print_product(&product, mode),
            None => print_error(&format!("Product '{}' not found", matches[0].id)),
        },
        _ => {
            print_error(&format!(
                "Multiple products named '{}'. Use a full ID:",
                input
            ));
            for m in &matches {
                println!("  product:{} ({})", m.id, m.name);
            }
        }
    }

    Ok(())
}

fn print_product(product: &Product, mode: OutputMode) {
    if mode == OutputMode::Json {
        output_json(product);
        return;
    }

    print_header(&format!("Product: {}", product.name));
    print_kv("ID", &product.id.to_string());
    if let Some(category) = &product.category {
        print_kv("Category", category);
    }
    if let Some(brand) = &product.brand {
        print_kv("Brand", brand);
    }
    if let Some(price) = product.price {
        print_kv("Price", &format!("{:.2}", price));
    }
    if let Some(source) = &product.source {
        print_kv("Source", source);
    }
    if let Some(url) = &product.image_url {
        print_kv("Image", url);
    }
    if let Some(url) = &product.product_url {
        print_kv("Page", url);
    }
    if product.embedded_at.is_some() {
        print_kv("Embedded", "yes");
    } else {
        print_kv("Embedded", "no");
        print_hint("  Run 'vestra embed' to fuse a style embedding.");
    }
}
