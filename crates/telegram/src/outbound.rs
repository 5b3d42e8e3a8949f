use {
    async_trait::async_trait,
    teloxide::{
        prelude::*,
        types::{ChatId, MessageId as TgMessageId},
    },
    tracing::{debug, warn},
};

use {
    courier_auto_reply::truncate_reply,
    courier_channels::{ChatTransport, Error as ChannelError, Operation, Result as ChannelResult},
    courier_common::{ConversationId, MessageId},
    courier_config::TELEGRAM_MAX_MESSAGE_LEN,
};

/// Outbound message sender for Telegram.
#[derive(Clone)]
pub struct TelegramOutbound {
    bot: Bot,
}

impl TelegramOutbound {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn chat_id(conversation: ConversationId) -> ChatId {
    ChatId(conversation.0)
}

#[async_trait]
impl ChatTransport for TelegramOutbound {
    async fn forward_message(
        &self,
        from: ConversationId,
        message_id: MessageId,
        to: ConversationId,
    ) -> ChannelResult<MessageId> {
        let sent = self
            .bot
            .forward_message(chat_id(to), chat_id(from), TgMessageId(message_id.0))
            .await
            .map_err(|e| ChannelError::platform(Operation::Forward, e))?;
        debug!(%from, %message_id, %to, forwarded = sent.id.0, "forwarded telegram message");
        Ok(MessageId(sent.id.0))
    }

    async fn send_text(&self, to: ConversationId, text: &str) -> ChannelResult<MessageId> {
        if text.trim().is_empty() {
            return Err(ChannelError::refused(Operation::SendText, "empty text"));
        }
        let text = if text.chars().count() > TELEGRAM_MAX_MESSAGE_LEN {
            warn!(conversation = %to, "outgoing text exceeds telegram limit, truncating");
            truncate_reply(text, TELEGRAM_MAX_MESSAGE_LEN)
        } else {
            text.to_string()
        };
        let sent = self
            .bot
            .send_message(chat_id(to), text)
            .await
            .map_err(|e| ChannelError::platform(Operation::SendText, e))?;
        debug!(conversation = %to, message_id = sent.id.0, "sent telegram message");
        Ok(MessageId(sent.id.0))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::mock_api::MockServer};

    #[tokio::test]
    async fn forward_returns_id_of_the_copy() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot.clone());

        let id = outbound
            .forward_message(ConversationId(1001), MessageId(7), ConversationId(999))
            .await
            .unwrap();

        assert_eq!(id, MessageId(500));
        let calls = server.api.calls("ForwardMessage");
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["chat_id"], 999);
        assert_eq!(calls[0]["from_chat_id"], 1001);
        assert_eq!(calls[0]["message_id"], 7);
    }

    #[tokio::test]
    async fn send_text_posts_plain_text() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot.clone());

        outbound
            .send_text(ConversationId(-100_123), "hello *world*")
            .await
            .unwrap();

        assert_eq!(server.api.texts_to(-100_123), ["hello *world*"]);
        assert!(server.api.calls("SendMessage")[0].get("parse_mode").is_none());
    }

    #[tokio::test]
    async fn oversized_text_is_capped_at_telegram_limit() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot.clone());

        outbound
            .send_text(ConversationId(1), &"a".repeat(TELEGRAM_MAX_MESSAGE_LEN + 50))
            .await
            .unwrap();

        let sent = server.api.texts_to(1);
        assert_eq!(sent[0].chars().count(), TELEGRAM_MAX_MESSAGE_LEN);
    }

    #[tokio::test]
    async fn api_errors_surface_as_platform_errors() {
        let server = MockServer::start().await;
        server.api.fail("SendMessage");
        let outbound = TelegramOutbound::new(server.bot.clone());

        let err = outbound
            .send_text(ConversationId(1), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Platform { .. }));
        assert!(err.to_string().contains("sendMessage"));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_locally() {
        let server = MockServer::start().await;
        let outbound = TelegramOutbound::new(server.bot.clone());

        let err = outbound.send_text(ConversationId(1), "  ").await.unwrap_err();
        assert!(matches!(err, ChannelError::Refused { .. }));
        assert!(server.api.calls("SendMessage").is_empty());
    }
}
