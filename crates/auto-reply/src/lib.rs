//! Inbound message processing: the glue between the chat transport, routing
//! state and the automated-reply provider.
//!
//! Flow: transport message → classify (command / admin reply / user message) →
//! forward to the administrator and record the route → acknowledge or
//! auto-reply → closing notice.

pub mod commands;
pub mod dispatcher;
pub mod error;
pub mod reply;
pub mod truncate;

pub use {
    commands::Command,
    dispatcher::{Dispatcher, Outcome},
    error::{Error, Result},
    reply::AutoReplier,
    truncate::truncate_reply,
};
