//! Routing state for the relay: which user conversation each message forwarded
//! to the administrator came from, plus the administrator's availability flag.
//!
//! State is loaded once at startup and every mutation is flushed to a
//! [`RoutingStore`] before the mutating call returns.

pub mod error;
pub mod state;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;

pub use {
    error::{Error, Result},
    state::RoutingState,
    store::{PersistedState, RoutingStore},
    store_memory::InMemoryStore,
    store_sqlite::SqliteStore,
};

/// Run database migrations for the routing crate.
///
/// Creates the `forwarded_messages` and `relay_flags` tables. Called by
/// [`SqliteStore::new`]; call it yourself before [`SqliteStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
