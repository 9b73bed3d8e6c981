pub mod commands;
pub mod config;
pub mod session;

pub use commands::{execute, Command, CommandError, FilterUpdate, Outcome};
pub use config::{AppConfig, ConfigError, CONFIG_ENV_VAR};
pub use session::{Session, SessionError};
