use serde::{Deserialize, Serialize};
use sortbook_import::CsvImportProfile;
use sortbook_storage::{StoreConfig, CATEGORIES_FILE_NAME, RULES_FILE_NAME};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV_VAR: &str = "SORTBOOK_CONFIG";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Everything the session needs to know about where things live.
///
/// ```toml
/// rules_path = "/home/me/.local/share/sortbook/keywords.json"
/// categories_path = "/home/me/.local/share/sortbook/categories_list.txt"
///
/// [import]
/// header_rows = 7
/// delimiter = ","
/// decimal_separator = "auto"   # or "point", "comma"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rules_path: PathBuf,
    pub categories_path: PathBuf,
    pub import: CsvImportProfile,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::in_dir(&data_dir)
    }
}

impl AppConfig {
    /// Defaults with both rule files placed in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            rules_path: dir.join(RULES_FILE_NAME),
            categories_path: dir.join(CATEGORIES_FILE_NAME),
            import: CsvImportProfile::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// A missing file is not an error: the defaults apply.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// `$SORTBOOK_CONFIG`, else `config.toml` in the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            rules_path: self.rules_path.clone(),
            categories_path: self.categories_path.clone(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sortbook", "Sortbook")
}
