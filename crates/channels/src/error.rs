use std::{error::Error as StdError, fmt};

pub type Result<T> = std::result::Result<T, Error>;

/// The outbound call that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Forward,
    SendText,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Forward => "forwardMessage",
            Self::SendText => "sendMessage",
        })
    }
}

/// Why a forward or send did not happen.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Refused before contacting the platform.
    #[error("{operation} refused: {reason}")]
    Refused {
        operation: Operation,
        reason: String,
    },

    /// The platform call failed or was rejected.
    #[error("{operation} failed: {source}")]
    Platform {
        operation: Operation,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn refused(operation: Operation, reason: impl Into<String>) -> Self {
        Self::Refused {
            operation,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn platform(operation: Operation, source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Platform {
            operation,
            source: Box::new(source),
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::Refused { operation, .. } | Self::Platform { operation, .. } => *operation,
        }
    }
}
