//! Configuration loading, env substitution, env overrides and validation.
//!
//! Config files: `courier.toml`, `courier.yaml` or `courier.json`.
//! Searched in `./` then `~/.config/courier/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw file,
//! followed by the deployment variables (`TELEGRAM_TOKEN`, `ADMIN_ID`, ...).

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, apply_process_env, data_dir, discover_and_load, find_config_file,
        load_config,
    },
    schema::{
        AdminConfig, AutoReplyConfig, CourierConfig, MessagesConfig, ServerConfig, StorageConfig,
        TELEGRAM_MAX_MESSAGE_LEN, TRUNCATION_MARKER, TelegramConfig, TransportMode,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_toml_str},
};
