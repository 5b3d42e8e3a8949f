pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to a text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection, TLS, or timeout failure before a response arrived.
    #[error("request to {provider} failed: {source}")]
    Network {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// The response body was not the expected shape.
    #[error("could not decode {provider} response: {message}")]
    Decode {
        provider: &'static str,
        message: String,
    },

    /// The service answered but produced no text.
    #[error("{provider} returned no text{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    Empty {
        provider: &'static str,
        reason: Option<String>,
    },
}

/// Longest error body kept in [`Error::Status`].
const MAX_ERROR_BODY_CHARS: usize = 300;

impl Error {
    #[must_use]
    pub fn network(provider: &'static str, source: reqwest::Error) -> Self {
        Self::Network { provider, source }
    }

    #[must_use]
    pub fn status(provider: &'static str, status: u16, body: &str) -> Self {
        Self::Status {
            provider,
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    #[must_use]
    pub fn decode(provider: &'static str, message: impl std::fmt::Display) -> Self {
        Self::Decode {
            provider,
            message: message.to_string(),
        }
    }

    /// Whether retrying the same request later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::Empty { .. } => false,
        }
    }
}
