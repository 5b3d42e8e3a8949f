//! `courier run`: wire storage, the auto-replier and Telegram together.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    courier_auto_reply::{AutoReplier, Dispatcher},
    courier_common::UserId,
    courier_config::{CourierConfig, Severity, TransportMode},
    courier_routing::RoutingState,
    courier_telegram::{TelegramOutbound, WebhookSettings},
    secrecy::ExposeSecret,
    tokio_util::sync::CancellationToken,
    tracing::{error, info, warn},
};

use crate::settings;

pub async fn handle_run(config: CourierConfig, data_dir: Option<&Path>) -> Result<()> {
    let validation = courier_config::validate(&config);
    for d in &validation.diagnostics {
        match d.severity {
            Severity::Error => error!("config: {d}"),
            Severity::Warning => warn!("config: {d}"),
            Severity::Info => info!("config: {d}"),
        }
    }
    validation
        .into_result()
        .context("configuration is incomplete, refusing to start")?;

    let admin = config
        .admin
        .id
        .map(UserId)
        .context("admin.id is not set")?;

    let store = settings::open_store(&config, data_dir).await?;
    let routing = Arc::new(RoutingState::load(store).await?);

    let generator = courier_providers::from_config(&config.auto_reply)?;
    let replier = AutoReplier::new(generator, &config.auto_reply, &config.messages);

    let bot = courier_telegram::build_bot(config.telegram.token.expose_secret())?;
    let connected = courier_telegram::connect(bot)
        .await
        .context("telegram rejected the bot token")?;
    courier_telegram::register_commands(&connected.bot).await;

    let transport = Arc::new(TelegramOutbound::new(connected.bot.clone()));
    let mut dispatcher = Dispatcher::new(
        transport,
        routing,
        replier,
        admin,
        config.messages.clone(),
    )?;
    if let Some(username) = connected.username {
        dispatcher = dispatcher.with_bot_username(username);
    }
    let dispatcher = Arc::new(dispatcher);

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            shutdown.cancel();
        }
    });

    match settings::effective_mode(&config) {
        TransportMode::Webhook => {
            let webhook = WebhookSettings::from_config(&config)?;
            courier_telegram::run_webhook(connected.bot, dispatcher, webhook, cancel).await?;
        },
        TransportMode::Polling | TransportMode::Auto => {
            courier_telegram::run_polling(connected.bot, dispatcher, cancel).await?;
        },
    }

    info!("courier stopped");
    Ok(())
}
