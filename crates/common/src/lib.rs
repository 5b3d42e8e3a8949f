//! Identifier types shared by the transport, the routing table and the dispatcher.

pub mod error;
pub mod types;

pub use {
    error::{Error, Result},
    types::{ConversationId, MessageId, UserId},
};
