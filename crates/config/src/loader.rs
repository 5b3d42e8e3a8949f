use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info},
};

use crate::{Error, Result, env_subst::substitute_env, schema::CourierConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "courier.toml",
    "courier.yaml",
    "courier.yml",
    "courier.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<CourierConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Load the explicit config file, or discover one in the standard locations.
///
/// Search order when `explicit` is `None`:
/// 1. `./courier.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/courier/courier.{toml,yaml,yml,json}` (user-global)
///
/// Returns `CourierConfig::default()` if no config file is found; the
/// deployment variables applied afterwards may still make it startable.
pub fn discover_and_load(explicit: Option<&Path>) -> Result<CourierConfig> {
    if let Some(path) = explicit {
        info!(path = %path.display(), "loading config");
        return load_config(path);
    }
    match find_config_file() {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            load_config(&path)
        },
        None => {
            debug!("no config file found, using defaults");
            Ok(CourierConfig::default())
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/courier/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "courier").map(|d| d.config_dir().to_path_buf())
}

/// Returns the directory holding the routing database, honouring an override.
pub fn data_dir(override_dir: Option<&Path>) -> PathBuf {
    if let Some(dir) = override_dir {
        return dir.to_path_buf();
    }
    directories::ProjectDirs::from("", "", "courier")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Apply the deployment environment variables on top of a loaded config.
///
/// | variable           | field                      |
/// |--------------------|----------------------------|
/// | `TELEGRAM_TOKEN`   | `telegram.token`           |
/// | `ADMIN_ID`         | `admin.id` (`0` = unset)   |
/// | `GEMINI_API_KEY`   | `auto_reply.api_key`       |
/// | `GOOGLE_API_KEY`   | `auto_reply.api_key` if `GEMINI_API_KEY` is unset |
/// | `WEBHOOK_BASE_URL` | `server.webhook_base_url`  |
/// | `PORT`             | `server.port`              |
pub fn apply_env_overrides(
    config: &mut CourierConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(token) = var("TELEGRAM_TOKEN") {
        config.telegram.token = Secret::new(token);
    }

    if let Some(raw) = var("ADMIN_ID") {
        let id: u64 = raw
            .parse()
            .map_err(|_| Error::invalid(format!("ADMIN_ID is not a numeric user id: {raw}")))?;
        config.admin.id = (id != 0).then_some(id);
    }

    if let Some(key) = var("GEMINI_API_KEY").or_else(|| var("GOOGLE_API_KEY")) {
        config.auto_reply.api_key = Some(Secret::new(key));
    }

    if let Some(url) = var("WEBHOOK_BASE_URL") {
        config.server.webhook_base_url = Some(url);
    }

    if let Some(raw) = var("PORT") {
        config.server.port = raw
            .parse()
            .map_err(|_| Error::invalid(format!("PORT is not a valid port number: {raw}")))?;
    }

    Ok(())
}

/// [`apply_env_overrides`] against the process environment.
pub fn apply_process_env(config: &mut CourierConfig) -> Result<()> {
    apply_env_overrides(config, |name| std::env::var(name).ok())
}

fn parse_config(raw: &str, path: &Path) -> Result<CourierConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}
