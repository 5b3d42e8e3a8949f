//! Routes each inbound message to the right handler.
//!
//! Classification order: commands, then administrator replies, then other
//! administrator messages (dropped), then user messages. Every per-message
//! failure is logged and, where useful, reported back in-chat; nothing here
//! returns an error to the transport.

use std::sync::Arc;

use {
    courier_channels::{ChatTransport, InboundMessage, MessageKind},
    courier_common::{ConversationId, MessageId, UserId},
    courier_config::MessagesConfig,
    courier_routing::RoutingState,
    tracing::{debug, error, info, warn},
};

use crate::{Command, Error, Result, reply::AutoReplier};

/// Characters of user text included in the per-message log line.
const LOG_PREVIEW_CHARS: usize = 200;

/// What the dispatcher did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// `/start` was answered.
    Started,
    /// The administrator changed availability. `persisted` is false when the
    /// store write failed and the change only lives in memory.
    AvailabilityChanged { available: bool, persisted: bool },
    /// A user message was relayed. `forwarded` is the id of the copy in the
    /// administrator's chat, or `None` when the plain-text fallback was used.
    Relayed {
        forwarded: Option<MessageId>,
        auto_replied: bool,
    },
    /// An administrator reply reached the origin conversation.
    ReplyDelivered { origin: ConversationId },
    /// An administrator reply could not be delivered.
    ReplyFailed { origin: ConversationId },
    /// The administrator replied to a message with no recorded origin.
    ReplyTargetMissing,
    /// Dropped without any outbound message.
    Ignored,
}

pub struct Dispatcher {
    transport: Arc<dyn ChatTransport>,
    routing: Arc<RoutingState>,
    replier: AutoReplier,
    admin: UserId,
    admin_chat: ConversationId,
    bot_username: Option<String>,
    messages: MessagesConfig,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        routing: Arc<RoutingState>,
        replier: AutoReplier,
        admin: UserId,
        messages: MessagesConfig,
    ) -> Result<Self> {
        if admin.0 == 0 {
            return Err(Error::InvalidAdmin);
        }
        let admin_chat = admin.private_conversation()?;
        Ok(Self {
            transport,
            routing,
            replier,
            admin,
            admin_chat,
            bot_username: None,
            messages,
        })
    }

    /// Only accept `/command@name` addressed to this bot.
    #[must_use]
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    pub fn admin(&self) -> UserId {
        self.admin
    }

    pub fn routing(&self) -> &Arc<RoutingState> {
        &self.routing
    }

    /// Handle one inbound message to completion.
    pub async fn handle(&self, msg: InboundMessage) -> Outcome {
        let from_admin = msg.sender.id == self.admin;

        if msg.kind == MessageKind::Text
            && let Some(command) = msg
                .text()
                .and_then(|t| Command::parse(t, self.bot_username.as_deref()))
        {
            return self.handle_command(&msg, command, from_admin).await;
        }

        if from_admin {
            return match msg.reply_to {
                Some(target) => self.handle_admin_reply(&msg, target).await,
                None => {
                    debug!(message_id = %msg.message_id, "admin message is not a reply, dropping");
                    Outcome::Ignored
                },
            };
        }

        self.handle_user_message(&msg).await
    }

    async fn handle_command(
        &self,
        msg: &InboundMessage,
        command: Command,
        from_admin: bool,
    ) -> Outcome {
        if command.admin_only() && !from_admin {
            debug!(user_id = %msg.sender.id, ?command, "ignoring admin command from non-admin");
            return Outcome::Ignored;
        }
        match command {
            Command::Start => {
                self.send(msg.conversation, &self.messages.start, "start reply")
                    .await;
                Outcome::Started
            },
            Command::Available => self.set_availability(msg.conversation, true).await,
            Command::Away => self.set_availability(msg.conversation, false).await,
            Command::Unknown(name) => {
                debug!(command = %name, "unknown command, dropping");
                Outcome::Ignored
            },
        }
    }

    async fn set_availability(&self, reply_to: ConversationId, available: bool) -> Outcome {
        let persisted = match self.routing.set_admin_available(available).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, available, "failed to persist admin availability");
                false
            },
        };
        let text = match (persisted, available) {
            (false, _) => &self.messages.availability_not_saved,
            (true, true) => &self.messages.admin_available,
            (true, false) => &self.messages.admin_away,
        };
        self.send(reply_to, text, "availability confirmation").await;
        Outcome::AvailabilityChanged {
            available,
            persisted,
        }
    }

    async fn handle_admin_reply(&self, msg: &InboundMessage, target: MessageId) -> Outcome {
        let origin = match self.routing.resolve_origin(target) {
            Ok(origin) => origin,
            Err(e) => {
                info!(%target, error = %e, "admin replied to an untracked message");
                self.send(
                    msg.conversation,
                    &self.messages.reply_target_missing,
                    "missing-target notice",
                )
                .await;
                return Outcome::ReplyTargetMissing;
            },
        };

        match self.deliver_admin_reply(msg, origin).await {
            Ok(()) => {
                info!(%origin, %target, "admin reply delivered");
                self.send(msg.conversation, &self.messages.reply_sent, "reply confirmation")
                    .await;
                Outcome::ReplyDelivered { origin }
            },
            Err(e) => {
                warn!(error = %e, %origin, "failed to deliver admin reply");
                self.send(msg.conversation, &self.messages.reply_failed, "reply failure notice")
                    .await;
                Outcome::ReplyFailed { origin }
            },
        }
    }

    /// Plain text is re-sent as text; anything else (media, captions) is
    /// forwarded unmodified.
    async fn deliver_admin_reply(&self, msg: &InboundMessage, origin: ConversationId) -> Result<()> {
        match (msg.kind, msg.text()) {
            (MessageKind::Text, Some(text)) => {
                self.transport.send_text(origin, text).await?;
            },
            _ => {
                self.transport
                    .forward_message(msg.conversation, msg.message_id, origin)
                    .await?;
            },
        }
        Ok(())
    }

    async fn handle_user_message(&self, msg: &InboundMessage) -> Outcome {
        let sender = &msg.sender;
        info!(
            sender = %sender.first_name,
            user_id = %sender.id,
            conversation = %msg.conversation,
            kind = msg.kind.describe(),
            "message from user: {}",
            msg.preview(LOG_PREVIEW_CHARS)
        );

        let forwarded = self.forward_to_admin(msg).await;

        if self.routing.admin_available() {
            self.send(msg.conversation, &self.messages.acknowledgment, "acknowledgment")
                .await;
            if self.messages.closing_notice_when_available {
                self.send(msg.conversation, &self.messages.closing_notice, "closing notice")
                    .await;
            }
            return Outcome::Relayed {
                forwarded,
                auto_replied: false,
            };
        }

        let auto_replied = if self.replier.is_configured() {
            self.send(msg.conversation, &self.messages.away_notice, "away notice")
                .await;
            let reply = self.replier.reply(msg.text().unwrap_or("")).await;
            self.send(msg.conversation, &reply, "auto-reply").await;
            true
        } else {
            self.send(msg.conversation, &self.messages.acknowledgment, "acknowledgment")
                .await;
            false
        };

        self.send(msg.conversation, &self.messages.closing_notice, "closing notice")
            .await;
        Outcome::Relayed {
            forwarded,
            auto_replied,
        }
    }

    /// Forward `msg` to the administrator and record where it came from.
    ///
    /// Falls back to a plain-text summary when forwarding fails.
    async fn forward_to_admin(&self, msg: &InboundMessage) -> Option<MessageId> {
        let admin_chat = self.admin_chat;
        match self
            .transport
            .forward_message(msg.conversation, msg.message_id, admin_chat)
            .await
        {
            Ok(forwarded) => {
                if let Err(e) = self.routing.record_forward(forwarded, msg.conversation).await {
                    error!(error = %e, %forwarded, origin = %msg.conversation, "failed to persist forward");
                }
                Some(forwarded)
            },
            Err(e) => {
                warn!(error = %e, user_id = %msg.sender.id, "forward failed, sending fallback to admin");
                let text = self.messages.render_forward_fallback(
                    &msg.sender.display_name(),
                    &msg.sender.id.to_string(),
                    msg.text().unwrap_or(""),
                );
                self.send(admin_chat, &text, "forward fallback").await;
                None
            },
        }
    }

    /// Best-effort send; failures are logged and swallowed.
    async fn send(&self, to: ConversationId, text: &str, what: &'static str) -> bool {
        match self.transport.send_text(to, text).await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, conversation = %to, what, "send failed");
                false
            },
        }
    }
}
