use {
    async_trait::async_trait,
    courier_common::{ConversationId, MessageId},
};

use crate::Result;

/// Outbound operations on the chat platform.
///
/// Every failure is surfaced as an [`Error`](crate::Error); callers decide
/// whether to fall back, report or swallow it. Implementations do not retry.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Copy `message_id` from `from` into `to`, returning the id of the copy.
    async fn forward_message(
        &self,
        from: ConversationId,
        message_id: MessageId,
        to: ConversationId,
    ) -> Result<MessageId>;

    /// Send plain text to `to`, returning the id of the sent message.
    async fn send_text(&self, to: ConversationId, text: &str) -> Result<MessageId>;
}
