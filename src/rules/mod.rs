//! Outfit compatibility rules.
//!
//! A static table mapping a garment category to the categories that complete
//! an outfit anchored by it. Loaded once at process start (built-in table or
//! `{data_path}/outfit_rules.toml` override), immutable for the process
//! lifetime, and passed explicitly into the retrieval service.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::VestraError;

/// Built-in rules table, compiled into the binary.
const DEFAULT_RULES: &str = include_str!("default_rules.toml");

/// Fallback entry used when a query category is absent or unknown.
pub const DEFAULT_ENTRY: &str = "default";

/// Where the active rules table came from.
#[derive(Debug, Clone)]
pub enum RulesSource {
    Builtin,
    File(PathBuf),
}

/// Immutable category-compatibility table.
#[derive(Debug, Clone)]
pub struct OutfitRules {
    targets: BTreeMap<String, Vec<String>>,
    source: RulesSource,
}

impl OutfitRules {
    /// Parse a rules table from TOML (`category = ["target", …]` per line).
    pub fn from_toml_str(content: &str) -> Result<Self, VestraError> {
        let targets: BTreeMap<String, Vec<String>> = toml::from_str(content)
            .map_err(|e| VestraError::Validation(format!("Invalid outfit rules: {e}")))?;
        Ok(Self {
            targets,
            source: RulesSource::Builtin,
        })
    }

    /// The built-in table.
    pub fn builtin() -> Result<Self, VestraError> {
        Self::from_toml_str(DEFAULT_RULES)
    }

    /// Target categories for a query product's category.
    ///
    /// An explicit entry wins even when its list is empty; a missing or
    /// unknown category falls back to the `default` entry; no `default`
    /// entry means no targets.
    pub fn targets_for(&self, category: Option<&str>) -> &[String] {
        category
            .and_then(|c| self.targets.get(c))
            .or_else(|| self.targets.get(DEFAULT_ENTRY))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// All entries, sorted by category.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Whether a category has an explicit entry (not counting the fallback).
    pub fn has_entry(&self, category: &str) -> bool {
        self.targets.contains_key(category)
    }

    pub fn source(&self) -> &RulesSource {
        &self.source
    }
}

/// Load outfit rules with priority:
/// 1. `{data_path}/outfit_rules.toml` file
/// 2. Built-in table
///
/// A present-but-broken override file logs a warning and falls back to the
/// built-in table rather than failing startup.
pub fn load_outfit_rules(data_path: &Path) -> Result<OutfitRules, VestraError> {
    let rules_path = data_path.join("outfit_rules.toml");
    if rules_path.exists() {
        match std::fs::read_to_string(&rules_path) {
            Ok(contents) => match OutfitRules::from_toml_str(&contents) {
                Ok(mut rules) => {
                    tracing::info!("Loaded outfit rules from {}", rules_path.display());
                    rules.source = RulesSource::File(rules_path);
                    return Ok(rules);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse {}: {}. Using built-in rules.",
                        rules_path.display(),
                        e
                    );
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read {}: {}. Using built-in rules.",
                    rules_path.display(),
                    e
                );
            }
        }
    }
    OutfitRules::builtin()
}
