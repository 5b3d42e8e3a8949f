//! Persistence trait for routing state.

use std::collections::HashMap;

use {
    async_trait::async_trait,
    courier_common::{ConversationId, MessageId},
};

use crate::Result;

/// Everything that must survive a restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// Forwarded message id (in the admin conversation) → origin conversation.
    pub forwards: HashMap<MessageId, ConversationId>,
    /// `false` means "away"; the default.
    pub admin_available: bool,
}

/// Persistence backend for routing state.
#[async_trait]
pub trait RoutingStore: Send + Sync {
    async fn load(&self) -> Result<PersistedState>;
    /// Insert a mapping; an existing mapping for `forwarded` is kept as-is.
    async fn insert_forward(&self, forwarded: MessageId, origin: ConversationId) -> Result<()>;
    async fn set_admin_available(&self, available: bool) -> Result<()>;
    async fn forward_count(&self) -> Result<u64>;
}
