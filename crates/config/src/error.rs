use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unsupported config format: .{extension}")]
    UnsupportedFormat { extension: String },

    /// The resolved configuration cannot start the relay.
    #[error("invalid configuration: {summary}")]
    Invalid { summary: String },
}

impl Error {
    #[must_use]
    pub fn invalid(summary: impl Into<String>) -> Self {
        Self::Invalid {
            summary: summary.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
