use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const RULES_FILE_NAME: &str = "keywords.json";
pub const CATEGORIES_FILE_NAME: &str = "categories_list.txt";

/// Where the rule store and the category list live. Always passed in
/// explicitly; nothing here resolves paths on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub rules_path: PathBuf,
    pub categories_path: PathBuf,
}

impl StoreConfig {
    /// Both files side by side in `dir`, under their usual names.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            rules_path: dir.join(RULES_FILE_NAME),
            categories_path: dir.join(CATEGORIES_FILE_NAME),
        }
    }
}
