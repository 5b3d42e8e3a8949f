//! Effective configuration: file, then environment, then command-line flags.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    anyhow::{Context, Result},
    courier_config::{CourierConfig, TransportMode},
    courier_routing::{InMemoryStore, RoutingStore, SqliteStore},
    tracing::{info, warn},
};

/// Database file name inside the data directory.
pub const DB_FILE: &str = "courier.db";

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub mode: Option<TransportMode>,
}

impl Overrides {
    pub fn apply(&self, config: &mut CourierConfig) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(mode) = self.mode {
            config.telegram.mode = mode;
        }
    }
}

/// Load the config file, then layer the process environment and `overrides`.
pub fn load(explicit: Option<&Path>, overrides: &Overrides) -> Result<CourierConfig> {
    let mut config = courier_config::discover_and_load(explicit)?;
    courier_config::apply_process_env(&mut config)?;
    overrides.apply(&mut config);
    Ok(config)
}

/// Resolve `auto` to the delivery mode actually used.
pub fn effective_mode(config: &CourierConfig) -> TransportMode {
    match config.telegram.mode {
        TransportMode::Auto => {
            let has_base_url = config
                .server
                .webhook_base_url
                .as_deref()
                .is_some_and(|u| !u.trim().is_empty());
            if has_base_url {
                TransportMode::Webhook
            } else {
                TransportMode::Polling
            }
        },
        mode => mode,
    }
}

/// Where routing state lives; `None` when it is kept in memory.
pub fn database_path(config: &CourierConfig, data_dir: Option<&Path>) -> Option<PathBuf> {
    if config.storage.is_ephemeral() {
        return None;
    }
    Some(
        config
            .storage
            .path
            .clone()
            .unwrap_or_else(|| courier_config::data_dir(data_dir).join(DB_FILE)),
    )
}

/// Open the configured routing store, creating the database if needed.
pub async fn open_store(
    config: &CourierConfig,
    data_dir: Option<&Path>,
) -> Result<Arc<dyn RoutingStore>> {
    match database_path(config, data_dir) {
        Some(path) => {
            let store = SqliteStore::open(&path)
                .await
                .with_context(|| format!("failed to open routing database {}", path.display()))?;
            info!(path = %path.display(), "routing database ready");
            Ok(Arc::new(store))
        },
        None => {
            warn!("storage.path is :memory:, routing state will not survive a restart");
            Ok(Arc::new(InMemoryStore::new()))
        },
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        courier_common::{ConversationId, MessageId},
        courier_config::{ServerConfig, StorageConfig, TelegramConfig},
        rstest::rstest,
    };

    fn config_with(mode: TransportMode, base_url: Option<&str>) -> CourierConfig {
        CourierConfig {
            telegram: TelegramConfig {
                mode,
                ..Default::default()
            },
            server: ServerConfig {
                webhook_base_url: base_url.map(str::to_string),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[rstest]
    #[case(TransportMode::Auto, None, TransportMode::Polling)]
    #[case(TransportMode::Auto, Some("   "), TransportMode::Polling)]
    #[case(TransportMode::Auto, Some("https://relay.example.com"), TransportMode::Webhook)]
    #[case(TransportMode::Polling, Some("https://relay.example.com"), TransportMode::Polling)]
    #[case(TransportMode::Webhook, None, TransportMode::Webhook)]
    fn resolves_delivery_mode(
        #[case] mode: TransportMode,
        #[case] base_url: Option<&str>,
        #[case] expected: TransportMode,
    ) {
        assert_eq!(effective_mode(&config_with(mode, base_url)), expected);
    }

    #[test]
    fn flags_override_file_and_environment() {
        let mut config = CourierConfig::default();
        courier_config::apply_env_overrides(&mut config, |name| {
            (name == "PORT").then(|| "3000".to_string())
        })
        .unwrap();
        assert_eq!(config.server.port, 3000);

        Overrides {
            port: Some(9000),
            mode: Some(TransportMode::Webhook),
        }
        .apply(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.telegram.mode, TransportMode::Webhook);

        Overrides::default().apply(&mut config);
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn explicit_config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        std::fs::write(&path, "[server]\nbind = \"127.0.0.1\"\n").unwrap();

        let config = courier_config::discover_and_load(Some(&path)).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1");
    }

    #[test]
    fn database_path_defaults_to_data_dir() {
        let config = CourierConfig::default();
        let dir = Path::new("/var/lib/courier");
        assert_eq!(
            database_path(&config, Some(dir)),
            Some(dir.join(DB_FILE))
        );

        let explicit = CourierConfig {
            storage: StorageConfig {
                path: Some(PathBuf::from("/srv/relay.db")),
            },
            ..Default::default()
        };
        assert_eq!(
            database_path(&explicit, Some(dir)),
            Some(PathBuf::from("/srv/relay.db"))
        );

        let memory = CourierConfig {
            storage: StorageConfig {
                path: Some(PathBuf::from(":memory:")),
            },
            ..Default::default()
        };
        assert_eq!(database_path(&memory, Some(dir)), None);
    }

    #[tokio::test]
    async fn store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let config = CourierConfig::default();

        let store = open_store(&config, Some(dir.path())).await.unwrap();
        store
            .insert_forward(MessageId(10), ConversationId(42))
            .await
            .unwrap();
        store.set_admin_available(true).await.unwrap();
        drop(store);

        let reopened = open_store(&config, Some(dir.path())).await.unwrap();
        let state = reopened.load().await.unwrap();
        assert!(state.admin_available);
        assert_eq!(state.forwards.get(&MessageId(10)), Some(&ConversationId(42)));
        assert!(dir.path().join(DB_FILE).exists());
    }
}
