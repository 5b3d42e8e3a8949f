//! Opaque identifiers shared by the transport, the routing table and the dispatcher.
//!
//! The chat platform assigns all of these; courier never mints its own.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An addressable chat destination (a user's private chat or a group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

/// A message identifier, unique within its conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i32);

/// A sender identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl UserId {
    /// The private conversation with this user.
    ///
    /// Telegram numbers a user's private chat with the user's own id, which is
    /// how the administrator's conversation is addressed. Fails for ids
    /// beyond the conversation id range.
    pub fn private_conversation(self) -> Result<ConversationId> {
        i64::try_from(self.0)
            .map(ConversationId)
            .map_err(|_| Error::invalid_id("conversation", self.0.to_string()))
    }
}

macro_rules! id_impls {
    ($ty:ident, $inner:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim()
                    .parse::<$inner>()
                    .map(Self)
                    .map_err(|_| Error::invalid_id($kind, s))
            }
        }

        impl From<$inner> for $ty {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

id_impls!(ConversationId, i64, "conversation");
id_impls!(MessageId, i32, "message");
id_impls!(UserId, u64, "user");
