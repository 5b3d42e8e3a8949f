//! Telegram transport for courier.
//!
//! Receives updates by long polling or webhook using the teloxide library,
//! hands each message to the dispatcher on its own task, and implements
//! `ChatTransport` for outbound forwards and sends.

pub mod bot;
pub mod error;
pub mod handlers;
pub mod outbound;
pub mod webhook;

#[cfg(test)]
mod mock_api;

pub use {
    bot::{ConnectedBot, build_bot, connect, register_commands, run_polling},
    error::{Error, Result},
    outbound::TelegramOutbound,
    webhook::{WebhookSettings, run_webhook},
};
