//! One-time conversion of the legacy flat keyword file
//! (`{"<description>": "<category>"}`) into the nested rule schema.

use serde_json::{Map, Value};
use sortbook_core::RuleSet;
use std::fs;
use std::path::Path;

use crate::rule_store::{save_rules, PersistenceError};

/// Every description becomes an exact rule of its category; categories are
/// declared in order of first appearance.
pub fn migrate_flat(content: &str) -> Result<RuleSet, PersistenceError> {
    let flat: Map<String, Value> = serde_json::from_str(content)?;
    let mut rules = RuleSet::new();
    for (description, category) in flat {
        let Value::String(category) = category else {
            return Err(PersistenceError::NotFlat(description));
        };
        rules.learn(&category, &description);
    }
    Ok(rules)
}

/// Converts `source` and writes the nested result to `dest`, which may be
/// the same file.
pub fn migrate_file(source: &Path, dest: &Path) -> Result<RuleSet, PersistenceError> {
    let content = fs::read_to_string(source)?;
    let rules = migrate_flat(&content)?;
    save_rules(dest, &rules)?;
    tracing::info!(
        "Migrated {} categories from {} to {}",
        rules.len(),
        source.display(),
        dest.display()
    );
    Ok(rules)
}
