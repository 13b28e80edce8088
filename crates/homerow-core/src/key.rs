// Homerow Key Type
// Key identifiers as the remapping engine names them, and the hand they sit on

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// A single key identifier such as `"a"`, `";"` or `"spacebar"`.
///
/// Keys are opaque names: the compiler never interprets them beyond
/// equality, so any token the downstream engine understands is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key(String);

impl Key {
    /// Get the name of this key
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key(name)
    }
}

impl Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("key name cannot be empty".to_string());
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(format!("key name cannot contain whitespace: '{}'", trimmed));
        }
        Ok(Key(trimmed.to_string()))
    }
}

/// Which half of a split layout a key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// The other hand
    pub fn opposite(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }
}

/// A key together with the hand derived from its layout position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalKey {
    pub key: Key,
    pub hand: Hand,
}

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.key, self.hand)
    }
}
