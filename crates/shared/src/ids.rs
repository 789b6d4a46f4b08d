//! Strongly-typed identifiers for game entities
//!
//! The game server uses integer primary keys for players, companions and
//! items, and opaque strings for combats, zones and events. Each gets its own
//! newtype so a companion id can never be passed where a player id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to define a strongly-typed integer ID
macro_rules! define_int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

/// Macro to define a strongly-typed string ID
macro_rules! define_str_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_int_id!(
    /// A player account. `0` is reserved by the server for "nobody"
    /// (the AI side in PvE, the absent winner of a draw).
    PlayerId
);
define_int_id!(CompanionId);
define_int_id!(ItemId);

define_str_id!(CombatId);
define_str_id!(ZoneId);
define_str_id!(
    /// Server-assigned event identity used for deduplication.
    EventId
);

impl PlayerId {
    /// The reserved "nobody" id.
    pub const NONE: PlayerId = PlayerId(0);

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}
