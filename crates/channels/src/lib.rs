//! Chat-transport contract consumed by the dispatcher.
//!
//! A transport turns platform updates into [`InboundMessage`]s and implements
//! [`ChatTransport`] for the two outbound operations the relay needs.

pub mod error;
pub mod message;
pub mod transport;

pub use {
    error::{Error, Operation, Result},
    message::{InboundMessage, MessageKind, Sender},
    transport::ChatTransport,
};
