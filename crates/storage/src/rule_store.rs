use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use sortbook_core::{CategoryRules, RuleSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::StoreConfig;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected a description → category map, but '{0}' maps to a non-string")]
    NotFlat(String),
}

/// Owns the rule set and the file it lives in.
#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    rules: RuleSet,
}

impl RuleStore {
    pub fn open(config: &StoreConfig) -> Self {
        let path = config.rules_path.clone();
        let rules = load_rules(&path);
        tracing::info!("Loaded {} rule categories from {}", rules.len(), path.display());
        Self { path, rules }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Reads the file again without touching the held rule set.
    pub fn load(&self) -> RuleSet {
        load_rules(&self.path)
    }

    pub fn reload(&mut self) {
        self.rules = self.load();
    }

    pub fn save(&self) -> Result<(), PersistenceError> {
        save_rules(&self.path, &self.rules)
    }

    /// Swaps in a whole new rule set and persists it. The in-memory set is
    /// replaced even when the write fails.
    pub fn replace(&mut self, rules: RuleSet) -> Result<(), PersistenceError> {
        self.rules = rules;
        self.save()
    }

    /// Learns `description` as an exact rule of `category`, then persists.
    pub fn learn(&mut self, category: &str, description: &str) -> Result<(), PersistenceError> {
        self.rules.learn(category, description);
        self.save()
    }

    /// Learns an edited row: `old_description` is forgotten everywhere and
    /// `description` becomes an exact rule of `category`. One save.
    pub fn relearn(
        &mut self,
        category: &str,
        old_description: &str,
        description: &str,
    ) -> Result<(), PersistenceError> {
        self.rules.relearn(category, old_description, description);
        self.save()
    }

    /// Writes the held rules to `path`, leaving the store's own file alone.
    pub fn export_to(&self, path: &Path) -> Result<(), PersistenceError> {
        save_rules(path, &self.rules)
    }
}

/// Never fails: a missing or unreadable file is an empty rule set.
pub fn load_rules(path: &Path) -> RuleSet {
    match fs::read_to_string(path) {
        Ok(content) => parse_rules(&content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No rule file at {}, starting empty", path.display());
            RuleSet::new()
        }
        Err(e) => {
            tracing::warn!("Could not read rule file {}: {e}", path.display());
            RuleSet::new()
        }
    }
}

/// Parses the nested `category → {exact, contains}` schema. Damage is
/// contained per category: a broken entry keeps its name but loses the
/// rules that could not be read.
pub fn parse_rules(content: &str) -> RuleSet {
    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Rule file is not valid JSON, ignoring it: {e}");
            return RuleSet::new();
        }
    };

    let Value::Object(entries) = value else {
        tracing::warn!("Rule file must contain a JSON object, ignoring it");
        return RuleSet::new();
    };

    entries
        .into_iter()
        .map(|(category, entry)| {
            let rules = parse_entry(&category, &entry);
            (category, rules)
        })
        .collect()
}

fn parse_entry(category: &str, entry: &Value) -> CategoryRules {
    let Value::Object(fields) = entry else {
        tracing::warn!("Rules for '{category}' are not an object, ignoring them");
        return CategoryRules::default();
    };

    CategoryRules {
        exact: string_list(category, "exact", fields.get("exact")),
        contains: string_list(category, "contains", fields.get("contains")),
    }
}

fn string_list(category: &str, field: &str, value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                other => {
                    tracing::warn!("Skipping non-string {field} rule {other} in '{category}'");
                    None
                }
            })
            .collect(),
        Some(other) => {
            tracing::warn!("'{category}'.{field} should be a list, found {other}");
            Vec::new()
        }
    }
}

/// Writes the rule set as 4-space indented JSON. The data goes to a sibling
/// temp file first and is renamed over `path`, so a failed write leaves the
/// previous file as it was.
pub fn save_rules(path: &Path, rules: &RuleSet) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    rules.serialize(&mut ser)?;
    buf.push(b'\n');

    let temp_path = temp_path_for(path);
    let written = fs::write(&temp_path, &buf).and_then(|()| fs::rename(&temp_path, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    tracing::debug!("Saved {} rule categories to {}", rules.len(), path.display());
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
