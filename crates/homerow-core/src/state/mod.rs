// Homerow State Variables
// Engine-side flags and timestamps the compiled rules read and write

pub mod namespace;

use std::fmt;

use crate::Key;

pub use namespace::{check_injective, NameCollision};

/// Name of the global typing-streak flag
pub const IS_TYPING_STREAK: &str = "isTypingStreak";

/// Name of the global streak-expiry timestamp
pub const STREAK_EXPIRY: &str = "streakExpiry";

/// A state variable living in the remapping engine.
///
/// The compiler never holds values for these; it only names them in
/// conditions and actions. Every variant maps to one engine-side name via
/// [`StateVar::name`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateVar {
    /// The home-row key is physically down
    Held(Key),
    /// The home-row key has been down past the hold threshold
    HeldReady(Key),
    /// The home-row key's letter was already emitted during this hold
    Outputted(Key),
    /// The layer is active
    Active(String),
    IsTypingStreak,
    StreakExpiry,
}

impl StateVar {
    pub fn held(key: &Key) -> Self {
        StateVar::Held(key.clone())
    }

    pub fn held_ready(key: &Key) -> Self {
        StateVar::HeldReady(key.clone())
    }

    pub fn outputted(key: &Key) -> Self {
        StateVar::Outputted(key.clone())
    }

    pub fn active(layer: &str) -> Self {
        StateVar::Active(layer.to_string())
    }

    /// The engine-side variable name
    pub fn name(&self) -> String {
        match self {
            StateVar::Held(key) => format!("{}Held", key),
            StateVar::HeldReady(key) => format!("{}HeldReady", key),
            StateVar::Outputted(key) => format!("{}Outputted", key),
            StateVar::Active(layer) => format!("{}Active", layer),
            StateVar::IsTypingStreak => IS_TYPING_STREAK.to_string(),
            StateVar::StreakExpiry => STREAK_EXPIRY.to_string(),
        }
    }
}

impl fmt::Display for StateVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
