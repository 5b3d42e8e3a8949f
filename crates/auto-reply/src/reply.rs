//! Automated replies while the administrator is away.

use std::{sync::Arc, time::Duration};

use {
    courier_config::{AutoReplyConfig, MessagesConfig},
    courier_providers::TextGenerator,
    tracing::{info, warn},
};

use crate::truncate::truncate_reply;

/// Wraps an optional [`TextGenerator`] so callers always get text back.
///
/// Every failure mode (provider error, timeout, panicking task, no provider
/// at all) degrades to a fixed fallback string.
#[derive(Clone)]
pub struct AutoReplier {
    generator: Option<Arc<dyn TextGenerator>>,
    prompt_template: String,
    timeout: Duration,
    max_reply_chars: usize,
    unavailable_text: String,
    failed_text: String,
}

impl AutoReplier {
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        config: &AutoReplyConfig,
        messages: &MessagesConfig,
    ) -> Self {
        Self {
            generator,
            prompt_template: config.prompt_template.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            max_reply_chars: config.max_reply_chars,
            unavailable_text: messages.generation_unavailable.clone(),
            failed_text: messages.generation_failed.clone(),
        }
    }

    /// Override the per-call time limit.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Embed the user's text in the prompt template.
    pub fn render_prompt(&self, user_text: &str) -> String {
        self.prompt_template.replace("{message}", user_text)
    }

    /// Produce a reply for `user_text`, never longer than the configured limit.
    pub async fn reply(&self, user_text: &str) -> String {
        let Some(generator) = &self.generator else {
            return self.unavailable_text.clone();
        };

        let prompt = self.render_prompt(user_text);
        let provider = generator.name();
        let generator = Arc::clone(generator);
        let task = tokio::spawn(async move { generator.generate(&prompt).await });
        let abort = task.abort_handle();

        let text = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(text))) => {
                info!(provider, reply_chars = text.chars().count(), "auto-reply generated");
                text
            },
            Ok(Ok(Err(e))) => {
                warn!(provider, error = %e, transient = e.is_transient(), "auto-reply generation failed");
                self.failed_text.clone()
            },
            Ok(Err(e)) => {
                warn!(provider, error = %e, "auto-reply task aborted");
                self.failed_text.clone()
            },
            Err(_) => {
                abort.abort();
                warn!(provider, timeout_secs = self.timeout.as_secs_f64(), "auto-reply generation timed out");
                self.failed_text.clone()
            },
        };

        truncate_reply(&text, self.max_reply_chars)
    }
}
