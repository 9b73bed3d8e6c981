pub mod categories;
pub mod config;
pub mod migrate;
pub mod rule_store;

pub use categories::{load_categories, parse_categories};
pub use config::{StoreConfig, CATEGORIES_FILE_NAME, RULES_FILE_NAME};
pub use migrate::{migrate_file, migrate_flat};
pub use rule_store::{load_rules, parse_rules, save_rules, PersistenceError, RuleStore};
