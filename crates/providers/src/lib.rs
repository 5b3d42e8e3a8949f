//! Text-generation providers used for automated replies.

pub mod error;
pub mod gemini;

use std::{sync::Arc, time::Duration};

use {async_trait::async_trait, courier_config::AutoReplyConfig, tracing::info};

pub use {
    error::{Error, Result},
    gemini::GeminiProvider,
};

/// A service that turns a prompt into reply text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the configured generator, or `None` when no API key is set.
pub fn from_config(config: &AutoReplyConfig) -> Result<Option<Arc<dyn TextGenerator>>> {
    let Some(api_key) = config.api_key() else {
        info!("no auto-reply api key configured, generated replies disabled");
        return Ok(None);
    };
    let provider = GeminiProvider::new(
        api_key,
        &config.base_url,
        &config.model,
        Duration::from_secs(config.timeout_secs.max(1)),
    )?;
    info!(
        provider = provider.name(),
        model = %config.model,
        "auto-reply provider configured"
    );
    Ok(Some(Arc::new(provider)))
}
