//! Outfit rules inspection handler.

use anyhow::Result;
use colored::Colorize;

use crate::cli::output::{output_json, print_hint, print_table, OutputMode};
use crate::init::AppContext;
use crate::rules::RulesSource;

pub async fn handle_rules(
    ctx: &AppContext,
    category: Option<&str>,
    mode: OutputMode,
) -> Result<()> {
    let rules = &ctx.rules;

    if let Some(cat) = category {
        let targets = rules.targets_for(Some(cat));

        if mode == OutputMode::Json {
            output_json(&serde_json::json!({
                "category": cat,
                "explicit": rules.has_entry(cat),
                "targets": targets,
            }));
            return Ok(());
        }

        if rules.has_entry(cat) {
            println!("'{}' goes with: {}", cat, format_targets(targets));
        } else {
            println!(
                "'{}' has no explicit rule; default applies: {}",
                cat,
                format_targets(targets)
            );
        }
        return Ok(());
    }

    if mode == OutputMode::Json {
        let entries: Vec<serde_json::Value> = rules
            .entries()
            .map(|(category, targets)| {
                serde_json::json!({"category": category, "targets": targets})
            })
            .collect();
        output_json(&serde_json::json!({
            "source": source_label(rules.source()),
            "rules": entries,
        }));
        return Ok(());
    }

    println!(
        "{}",
        format!("Outfit rules ({})", source_label(rules.source())).bold()
    );
    println!();

    let rows: Vec<Vec<String>> = rules
        .entries()
        .map(|(category, targets)| vec![category.to_string(), format_targets(targets)])
        .collect();

    print_table(&["Category", "Goes With"], rows);
    print_hint(&format!(
        "Override with {}",
        ctx.data_path.join("outfit_rules.toml").display()
    ));

    Ok(())
}

fn format_targets(targets: &[String]) -> String {
    if targets.is_empty() {
        "(none)".to_string()
    } else {
        targets.join(", ")
    }
}

fn source_label(source: &RulesSource) -> String {
    match source {
        RulesSource::Builtin => "built-in".to_string(),
        RulesSource::File(path) => path.display().to_string(),
    }
}
