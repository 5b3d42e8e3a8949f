use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] teloxide::RequestError),

    /// Building the HTTP client failed.
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Telegram terminated our `getUpdates` because another process is
    /// polling with the same token.
    #[error("another bot instance is already polling with this token")]
    Conflict,

    #[error("webhook mode requires server.webhook_base_url")]
    MissingWebhookUrl,

    #[error("invalid webhook base url {url}: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },

    #[error("invalid listen address {addr}: {reason}")]
    InvalidListenAddr { addr: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
