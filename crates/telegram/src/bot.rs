use std::{sync::Arc, time::Duration};

use {
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, BotCommand},
    },
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, info, warn},
};

use courier_auto_reply::{Command, Dispatcher};

use crate::{Result, error::Error, handlers};

/// Long-poll timeout passed to `getUpdates`, in seconds.
pub const POLL_TIMEOUT_SECS: u32 = 30;

/// Longer than the long-poll timeout so the HTTP client doesn't abort the
/// request before Telegram responds.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// A bot whose token has been verified with `getMe`.
pub struct ConnectedBot {
    pub bot: Bot,
    pub username: Option<String>,
}

/// Build a bot client for `token`.
pub fn build_bot(token: &str) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(CLIENT_TIMEOUT)
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Verify credentials and fetch the bot's username.
pub async fn connect(bot: Bot) -> Result<ConnectedBot> {
    let me = bot.get_me().await?;
    let username = me.username.clone();
    info!(username = ?username, "telegram bot connected");
    Ok(ConnectedBot { bot, username })
}

/// Register slash commands for autocomplete in Telegram clients.
pub async fn register_commands(bot: &Bot) {
    let commands: Vec<BotCommand> = Command::MENU
        .iter()
        .map(|(name, description)| BotCommand::new(*name, *description))
        .collect();
    if let Err(e) = bot.set_my_commands(commands).await {
        warn!(error = %e, "failed to register bot commands");
    }
}

/// Receive updates by long polling until `cancel` fires.
///
/// Each message is handled on its own task. On the way out, handlers that
/// are still running get [`handlers::SHUTDOWN_GRACE`] to finish. Returns
/// [`Error::Conflict`] when another process is polling with the same token.
pub async fn run_polling(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
) -> Result<()> {
    // Long polling and webhooks are mutually exclusive.
    bot.delete_webhook().send().await?;
    info!("starting telegram polling loop (webhook cleared)");

    let tracker = TaskTracker::new();
    let result = poll_updates(&bot, &dispatcher, &tracker, &cancel).await;
    handlers::drain(&tracker, handlers::SHUTDOWN_GRACE).await;
    info!("telegram polling stopped");
    result
}

async fn poll_updates(
    bot: &Bot,
    dispatcher: &Arc<Dispatcher>,
    tracker: &TaskTracker,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut offset: i32 = 0;
    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(POLL_TIMEOUT_SECS)
            .allowed_updates(vec![AllowedUpdate::Message]);

        let result = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    handlers::spawn_update(dispatcher, tracker, update);
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram polling disabled: another instance is already running with this token");
                return Err(Error::Conflict);
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => return Ok(()),
                    () = tokio::time::sleep(ERROR_BACKOFF) => {},
                }
            },
        }
    }
}
