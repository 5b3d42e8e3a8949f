//! In-memory store for tests and `storage.path = ":memory:"`.

use std::sync::Mutex;

use {
    async_trait::async_trait,
    courier_common::{ConversationId, MessageId},
};

use crate::{
    Result,
    store::{PersistedState, RoutingStore},
};

/// In-memory store backed by a `HashMap`. Nothing survives the process.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<PersistedState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, as if it had been loaded from disk.
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl RoutingStore for InMemoryStore {
    async fn load(&self) -> Result<PersistedState> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.clone())
    }

    async fn insert_forward(&self, forwarded: MessageId, origin: ConversationId) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.forwards.entry(forwarded).or_insert(origin);
        Ok(())
    }

    async fn set_admin_available(&self, available: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.admin_available = available;
        Ok(())
    }

    async fn forward_count(&self) -> Result<u64> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.forwards.len() as u64)
    }
}
