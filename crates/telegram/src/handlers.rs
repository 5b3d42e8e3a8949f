use std::{sync::Arc, time::Duration};

use {
    teloxide::types::{MediaKind, Message, MessageKind as TgMessageKind, Update, UpdateKind},
    tokio::task::JoinHandle,
    tokio_util::task::TaskTracker,
    tracing::{debug, info, warn},
};

use {
    courier_auto_reply::{Dispatcher, Outcome},
    courier_channels::{InboundMessage, MessageKind, Sender},
    courier_common::{ConversationId, MessageId, UserId},
};

/// How long shutdown waits for in-flight handlers before giving up on them.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Hand an update to the dispatcher on its own task, tracked by `tracker`.
///
/// Returns `None` for updates the relay does not handle (edits, callback
/// queries, service messages, messages without a sender).
pub fn spawn_update(
    dispatcher: &Arc<Dispatcher>,
    tracker: &TaskTracker,
    update: Update,
) -> Option<JoinHandle<Outcome>> {
    let msg = match update.kind {
        UpdateKind::Message(msg) => msg,
        other => {
            debug!("ignoring non-message update: {other:?}");
            return None;
        },
    };
    let Some(inbound) = to_inbound(&msg) else {
        debug!(chat_id = msg.chat.id.0, "ignoring message without a user sender");
        return None;
    };
    let dispatcher = Arc::clone(dispatcher);
    Some(tracker.spawn(async move { dispatcher.handle(inbound).await }))
}

/// Close `tracker` and wait up to `grace` for its handlers to finish.
///
/// Returns `false` when some handlers were still running at the deadline.
pub async fn drain(tracker: &TaskTracker, grace: Duration) -> bool {
    tracker.close();
    if tracker.is_empty() {
        return true;
    }
    info!(pending = tracker.len(), "waiting for in-flight handlers");
    match tokio::time::timeout(grace, tracker.wait()).await {
        Ok(()) => true,
        Err(_) => {
            warn!(
                pending = tracker.len(),
                "shutdown grace period elapsed, abandoning running handlers"
            );
            false
        },
    }
}

/// Normalize a Telegram message for the dispatcher.
pub fn to_inbound(msg: &Message) -> Option<InboundMessage> {
    let TgMessageKind::Common(common) = &msg.kind else {
        return None;
    };
    let from = msg.from.as_ref()?;
    Some(InboundMessage {
        conversation: ConversationId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        sender: Sender {
            id: UserId(from.id.0),
            first_name: from.first_name.clone(),
            last_name: from.last_name.clone(),
            username: from.username.clone(),
        },
        text: extract_text(&common.media_kind),
        kind: message_kind(&common.media_kind),
        reply_to: msg.reply_to_message().map(|r| MessageId(r.id.0)),
    })
}

/// Text of a text message, or the caption of a media message.
fn extract_text(media: &MediaKind) -> Option<String> {
    match media {
        MediaKind::Text(t) => Some(t.text.clone()),
        MediaKind::Photo(p) => p.caption.clone(),
        MediaKind::Document(d) => d.caption.clone(),
        MediaKind::Audio(a) => a.caption.clone(),
        MediaKind::Voice(v) => v.caption.clone(),
        MediaKind::Video(vid) => vid.caption.clone(),
        MediaKind::Animation(a) => a.caption.clone(),
        _ => None,
    }
}

fn message_kind(media: &MediaKind) -> MessageKind {
    match media {
        MediaKind::Text(_) => MessageKind::Text,
        MediaKind::Photo(_) => MessageKind::Photo,
        MediaKind::Sticker(_) => MessageKind::Sticker,
        MediaKind::Document(_) => MessageKind::Document,
        MediaKind::Voice(_) => MessageKind::Voice,
        MediaKind::Audio(_) => MessageKind::Audio,
        MediaKind::Video(_) | MediaKind::VideoNote(_) => MessageKind::Video,
        MediaKind::Animation(_) => MessageKind::Animation,
        MediaKind::Location(_) | MediaKind::Venue(_) => MessageKind::Location,
        MediaKind::Contact(_) => MessageKind::Contact,
        _ => MessageKind::Other,
    }
}
