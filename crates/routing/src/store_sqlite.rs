//! SQLite-backed routing store using sqlx.

use std::{
    path::Path,
    time::{SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    courier_common::{ConversationId, MessageId},
    sqlx::{
        Row, SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::debug,
};

use crate::{
    Result,
    store::{PersistedState, RoutingStore},
};

const ADMIN_AVAILABLE_KEY: &str = "admin_available";

/// SQLite-backed persistence for the routing table and relay flags.
pub struct SqliteStore {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl SqliteStore {
    /// Create a new store with its own connection pool and run migrations.
    ///
    /// `sqlite::memory:` databases are limited to a single connection, since
    /// every connection would otherwise see its own empty database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        crate::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Open (creating if needed) a database file and run migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| crate::Error::message(format!("create {}: {e}", parent.display())))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        crate::run_migrations(&pool).await?;
        debug!(path = %path.display(), "opened routing database");

        Ok(Self { pool })
    }

    /// Create a store using an existing pool (migrations must already be run).
    ///
    /// Call [`crate::run_migrations`] before using this constructor.
    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoutingStore for SqliteStore {
    async fn load(&self) -> Result<PersistedState> {
        let rows = sqlx::query("SELECT forwarded_id, origin_chat_id FROM forwarded_messages")
            .fetch_all(&self.pool)
            .await?;

        let mut state = PersistedState::default();
        state.forwards.reserve(rows.len());
        for row in rows {
            let forwarded: i64 = row.get("forwarded_id");
            let origin: i64 = row.get("origin_chat_id");
            let Ok(forwarded) = i32::try_from(forwarded) else {
                continue;
            };
            state
                .forwards
                .insert(MessageId(forwarded), ConversationId(origin));
        }

        let flag = sqlx::query_scalar::<_, String>("SELECT value FROM relay_flags WHERE key = ?")
            .bind(ADMIN_AVAILABLE_KEY)
            .fetch_optional(&self.pool)
            .await?;
        state.admin_available = flag.as_deref() == Some("true");

        Ok(state)
    }

    async fn insert_forward(&self, forwarded: MessageId, origin: ConversationId) -> Result<()> {
        sqlx::query(
            "INSERT INTO forwarded_messages (forwarded_id, origin_chat_id, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(forwarded_id) DO NOTHING",
        )
        .bind(i64::from(forwarded.0))
        .bind(origin.0)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_admin_available(&self, available: bool) -> Result<()> {
        sqlx::query(
            "INSERT INTO relay_flags (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(ADMIN_AVAILABLE_KEY)
        .bind(if available {
            "true"
        } else {
            "false"
        })
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn forward_count(&self) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM forwarded_messages")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
