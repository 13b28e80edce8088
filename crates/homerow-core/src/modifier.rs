// Homerow Modifier System
// The four canonical modifiers and ordered modifier sets

use std::fmt;
use std::str::FromStr;

use smallvec::SmallVec;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// One of the four canonical modifiers a home-row key can stand in for.
///
/// Displays as its symbol (`⌃ ⌘ ⇧ ⌥`) and parses from either the symbol
/// or a name alias. Name aliases are case-insensitive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Modifier {
    #[strum(to_string = "⌃", serialize = "ctrl", serialize = "control", serialize = "c")]
    Control,
    #[strum(
        to_string = "⌘",
        serialize = "cmd",
        serialize = "command",
        serialize = "meta",
        serialize = "super",
        serialize = "win"
    )]
    Command,
    #[strum(to_string = "⇧", serialize = "shift")]
    Shift,
    #[strum(
        to_string = "⌥",
        serialize = "opt",
        serialize = "option",
        serialize = "alt",
        serialize = "a"
    )]
    Alt,
}

impl Modifier {
    /// Parse a modifier from its symbol or alias
    pub fn parse(s: &str) -> Result<Self, ModifierError> {
        Modifier::from_str(s.trim()).map_err(|_| ModifierError::Unknown(s.trim().to_string()))
    }

    /// All canonical modifiers, in declaration order
    pub fn all() -> impl Iterator<Item = Modifier> {
        Modifier::iter()
    }

    /// The symbol for this modifier
    pub fn symbol(self) -> char {
        match self {
            Modifier::Control => '⌃',
            Modifier::Command => '⌘',
            Modifier::Shift => '⇧',
            Modifier::Alt => '⌥',
        }
    }

    fn from_symbol(c: char) -> Option<Modifier> {
        Modifier::iter().find(|m| m.symbol() == c)
    }
}

/// Errors that can occur when parsing modifiers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModifierError {
    #[error("unknown modifier: '{0}'")]
    Unknown(String),

    #[error("modifier list cannot be empty")]
    Empty,
}

/// An ordered, duplicate-free list of modifiers.
///
/// Order is preserved because combined home-row modifiers are emitted in
/// the order their keys were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ModifierSet(SmallVec<[Modifier; 4]>);

impl ModifierSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self(SmallVec::new())
    }

    /// Create a set holding one modifier
    pub fn single(modifier: Modifier) -> Self {
        let mut set = Self::new();
        set.insert(modifier);
        set
    }

    /// Append a modifier unless it is already present
    pub fn insert(&mut self, modifier: Modifier) -> bool {
        if self.0.contains(&modifier) {
            return false;
        }
        self.0.push(modifier);
        true
    }

    /// Check if a modifier is in the set
    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0.contains(&modifier)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.0.iter().copied()
    }

    /// Parse a modifier list.
    ///
    /// Accepts a run of symbols (`"⌘⇧"`) or aliases joined by `-`, `+` or
    /// whitespace (`"cmd+shift"`, `"Ctrl-Opt"`).
    pub fn parse(s: &str) -> Result<Self, ModifierError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ModifierError::Empty);
        }

        if trimmed.chars().all(|c| Modifier::from_symbol(c).is_some()) {
            return Ok(trimmed.chars().filter_map(Modifier::from_symbol).collect());
        }

        trimmed
            .split(|c: char| c == '-' || c == '+' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(Modifier::parse)
            .collect()
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Self::new();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl From<Modifier> for ModifierSet {
    fn from(modifier: Modifier) -> Self {
        Self::single(modifier)
    }
}

impl fmt::Display for ModifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.0 {
            write!(f, "{}", modifier)?;
        }
        Ok(())
    }
}
