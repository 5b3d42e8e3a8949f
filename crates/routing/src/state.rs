use std::sync::{Arc, RwLock};

use {
    courier_common::{ConversationId, MessageId},
    tokio::sync::Mutex,
    tracing::{debug, info},
};

use crate::{
    Error, Result,
    store::{PersistedState, RoutingStore},
};

/// Shared routing state handed to every handler invocation.
///
/// Reads are served from memory. Writes update memory first, then await the
/// store; the read/write lock is released before that await, so a slow disk
/// never blocks lookups from other conversations. Availability changes also
/// hold `flag_writes` across the store write, so the last flag set in memory
/// is the last one persisted.
pub struct RoutingState {
    inner: RwLock<PersistedState>,
    flag_writes: Mutex<()>,
    store: Arc<dyn RoutingStore>,
}

impl RoutingState {
    /// Load persisted state from `store`.
    pub async fn load(store: Arc<dyn RoutingStore>) -> Result<Self> {
        let state = store.load().await?;
        info!(
            forwards = state.forwards.len(),
            admin_available = state.admin_available,
            "routing state loaded"
        );
        Ok(Self {
            inner: RwLock::new(state),
            flag_writes: Mutex::new(()),
            store,
        })
    }

    /// Remember that `forwarded` (in the admin conversation) came from `origin`.
    ///
    /// Returns `false` when the id was already known; the existing mapping is
    /// kept and nothing is written.
    pub async fn record_forward(
        &self,
        forwarded: MessageId,
        origin: ConversationId,
    ) -> Result<bool> {
        let inserted = {
            let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
            match state.forwards.entry(forwarded) {
                std::collections::hash_map::Entry::Occupied(_) => false,
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(origin);
                    true
                },
            }
        };
        if !inserted {
            debug!(%forwarded, "forward already recorded");
            return Ok(false);
        }
        self.store.insert_forward(forwarded, origin).await?;
        debug!(%forwarded, %origin, "recorded forward");
        Ok(true)
    }

    /// The conversation a forwarded message came from.
    pub fn resolve_origin(&self, forwarded: MessageId) -> Result<ConversationId> {
        let state = self.inner.read().unwrap_or_else(|e| e.into_inner());
        state
            .forwards
            .get(&forwarded)
            .copied()
            .ok_or_else(|| Error::routing_not_found(forwarded))
    }

    pub fn admin_available(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .admin_available
    }

    /// Set the availability flag and persist it.
    ///
    /// The in-memory flag changes even when persisting fails, so the current
    /// process behaves as the administrator asked.
    pub async fn set_admin_available(&self, available: bool) -> Result<()> {
        let _serialized = self.flag_writes.lock().await;
        {
            let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
            state.admin_available = available;
        }
        self.store.set_admin_available(available).await?;
        info!(admin_available = available, "admin availability changed");
        Ok(())
    }

    /// Number of tracked forwards.
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .forwards
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
