use {courier_common::MessageId, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    /// The administrator replied to a message that was never forwarded by us.
    #[error("no conversation recorded for forwarded message {forwarded_id}")]
    RoutingNotFound { forwarded_id: MessageId },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn routing_not_found(forwarded_id: MessageId) -> Self {
        Self::RoutingNotFound { forwarded_id }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::RoutingNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
