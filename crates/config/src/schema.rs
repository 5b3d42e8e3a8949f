/// Config schema types (telegram, admin, server, auto-reply, storage, messages).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
};

/// Telegram caps a single text message at 4096 characters.
pub const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// Appended to generated replies cut at `auto_reply.max_reply_chars`.
/// Ten characters, so a 4000-character limit keeps 3990 of the original.
pub const TRUNCATION_MARKER: &str = "…[trimmed]";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    pub telegram: TelegramConfig,
    pub admin: AdminConfig,
    pub server: ServerConfig,
    pub auto_reply: AutoReplyConfig,
    pub storage: StorageConfig,
    pub messages: MessagesConfig,
}

/// How inbound updates reach the process.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    /// Webhook when `server.webhook_base_url` is set, long polling otherwise.
    #[default]
    Auto,
    Polling,
    Webhook,
}

impl std::str::FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "polling" | "poll" => Ok(Self::Polling),
            "webhook" => Ok(Self::Webhook),
            other => Err(format!("unknown transport mode: {other}")),
        }
    }
}

/// Telegram bot account.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot token from @BotFather.
    pub token: Secret<String>,

    /// Polling or webhook delivery.
    pub mode: TransportMode,

    /// When set, webhook calls must carry this value in
    /// `X-Telegram-Bot-Api-Secret-Token`.
    pub webhook_secret: Option<Secret<String>>,
}

impl TelegramConfig {
    #[must_use]
    pub fn has_token(&self) -> bool {
        !self.token.expose_secret().trim().is_empty()
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"[REDACTED]")
            .field("mode", &self.mode)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            mode: TransportMode::default(),
            webhook_secret: None,
        }
    }
}

/// The single privileged identity.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Numeric Telegram user id of the administrator.
    pub id: Option<u64>,
}

/// Webhook listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "0.0.0.0".
    pub bind: String,
    /// Port to listen on. Defaults to 8080.
    pub port: u16,
    /// Public base URL Telegram should call, e.g. `https://relay.example.com`.
    pub webhook_base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 8080,
            webhook_base_url: None,
        }
    }
}

/// External text-generation service used while the administrator is away.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AutoReplyConfig {
    /// Gemini API key. Auto-replies are disabled when absent.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    /// Upper bound on a single generation call.
    pub timeout_secs: u64,
    /// Prompt sent to the model; `{message}` is replaced with the user's text.
    pub prompt_template: String,
    /// Generated replies longer than this are truncated.
    pub max_reply_chars: usize,
}

impl AutoReplyConfig {
    /// The API key, if one is configured and non-blank.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|k| k.expose_secret().as_str())
            .filter(|k| !k.trim().is_empty())
    }
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 30,
            prompt_template: "Reply politely and briefly to this user message: {message}".into(),
            max_reply_chars: 4000,
        }
    }
}

/// Durable routing state location.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. `:memory:` keeps state for the process lifetime only.
    /// Defaults to `<data dir>/courier.db`.
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    #[must_use]
    pub fn is_ephemeral(&self) -> bool {
        self.path
            .as_deref()
            .is_some_and(|p| p.as_os_str() == ":memory:")
    }
}

/// Every fixed string courier sends to users or to the administrator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    /// Reply to `/start`.
    pub start: String,
    /// Reply to a user when no automated answer is produced.
    pub acknowledgment: String,
    /// Sent after every handled user message.
    pub closing_notice: String,
    /// Also send the closing notice when the administrator is available.
    pub closing_notice_when_available: bool,
    /// Sent right before an automated reply is generated.
    pub away_notice: String,
    /// Automated reply used when no generation service is configured.
    pub generation_unavailable: String,
    /// Automated reply used when the generation call fails or times out.
    pub generation_failed: String,
    /// Sent to the administrator when forwarding fails. `{name}`, `{id}` and
    /// `{text}` are substituted.
    pub forward_fallback: String,
    pub admin_available: String,
    pub admin_away: String,
    /// Sent to the administrator when the availability flag was changed in
    /// memory but could not be persisted.
    pub availability_not_saved: String,
    pub reply_target_missing: String,
    pub reply_sent: String,
    pub reply_failed: String,
}

impl MessagesConfig {
    /// Render the forward-failure notification for the administrator.
    #[must_use]
    pub fn render_forward_fallback(&self, name: &str, id: &str, text: &str) -> String {
        self.forward_fallback
            .replace("{name}", name)
            .replace("{id}", id)
            .replace("{text}", text)
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            start: "Admin will reply in 48 hours.".into(),
            acknowledgment: "Admin will reply in 48 hours.".into(),
            closing_notice: "Admin will reply in 48 hours.".into(),
            closing_notice_when_available: false,
            away_notice: "Admin is away — I'm replying... 🤖".into(),
            generation_unavailable: "Sorry, I cannot reply right now.".into(),
            generation_failed: "Sorry — I can't reply right now.".into(),
            forward_fallback: "Message from {name} ({id}):\n{text}".into(),
            admin_available: "Admin is now AVAILABLE.".into(),
            admin_away: "Admin is now AWAY.".into(),
            availability_not_saved:
                "⚠️ Availability changed, but saving it failed. It will reset on restart.".into(),
            reply_target_missing: "❌ Cannot find the user to reply to.".into(),
            reply_sent: "✅ Sent to user.".into(),
            reply_failed: "❌ Failed to send message to user.".into(),
        }
    }
}
