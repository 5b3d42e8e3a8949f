use {
    courier_common::{ConversationId, MessageId, UserId},
    serde::{Deserialize, Serialize},
};

/// What an inbound message carries besides (optional) text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Photo,
    Sticker,
    Document,
    Voice,
    Audio,
    Video,
    Animation,
    Location,
    Contact,
    Other,
}

impl MessageKind {
    /// Short human label used in logs.
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Photo => "photo",
            Self::Sticker => "sticker",
            Self::Document => "document",
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Animation => "animation/GIF",
            Self::Location => "location",
            Self::Contact => "contact",
            Self::Other => "unknown media",
        }
    }
}

/// Who sent a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    /// "First Last", falling back to the username, then to the numeric id.
    #[must_use]
    pub fn display_name(&self) -> String {
        let last = self.last_name.as_deref().unwrap_or("");
        let name = format!("{} {last}", self.first_name).trim().to_string();
        if !name.is_empty() {
            return name;
        }
        self.username
            .clone()
            .unwrap_or_else(|| self.id.to_string())
    }
}

/// A platform message normalized for the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub conversation: ConversationId,
    pub message_id: MessageId,
    pub sender: Sender,
    /// Message text, or the caption of a media message.
    pub text: Option<String>,
    pub kind: MessageKind,
    /// The message this one replies to, if any.
    pub reply_to: Option<MessageId>,
}

impl InboundMessage {
    /// Non-empty text or caption.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Text trimmed to `max_chars` characters for logging, or `<media>`.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> String {
        match self.text() {
            Some(text) => text.chars().take(max_chars).collect(),
            None => "<media>".to_string(),
        }
    }
}
