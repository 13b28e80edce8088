// Homerow Config API - Binding String Parser
// Parses layer binding strings like "Cmd-left_arrow" into an output key and modifiers

use super::OutputBinding;
use crate::modifier::{Modifier, ModifierSet};
use crate::Key;

/// Errors that can occur during binding parsing
#[derive(Debug, Clone, PartialEq)]
pub enum BindingParseError {
    /// Empty input string
    EmptyInput,
    /// Modifier alias not recognized
    UnknownModifier(String),
    /// Input ends with hyphen (e.g., "Cmd-")
    TrailingHyphen,
    /// Key part is not a usable key name
    InvalidKey(String),
}

impl std::fmt::Display for BindingParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingParseError::EmptyInput => write!(f, "binding string cannot be empty"),
            BindingParseError::UnknownModifier(name) => write!(f, "unknown modifier: '{}'", name),
            BindingParseError::TrailingHyphen => write!(f, "binding string cannot end with hyphen"),
            BindingParseError::InvalidKey(reason) => write!(f, "invalid key: {}", reason),
        }
    }
}

impl std::error::Error for BindingParseError {}

/// Parse a binding string like "Cmd-Shift-z" into an output binding
///
/// Everything before the last hyphen-separated part is a modifier; the
/// last part is the key. A bare key name has no modifiers.
///
/// # Examples
/// ```
/// use homerow_core::config::parse_binding_string;
/// let binding = parse_binding_string("Cmd-left_arrow").unwrap();
/// assert_eq!(binding.key.name(), "left_arrow");
/// assert_eq!(binding.modifiers.len(), 1);
/// ```
pub fn parse_binding_string(exp: &str) -> Result<OutputBinding, BindingParseError> {
    let trimmed = exp.trim();
    if trimmed.is_empty() {
        return Err(BindingParseError::EmptyInput);
    }

    // A lone hyphen is the hyphen key itself
    if trimmed == "-" {
        return Ok(OutputBinding::key("-"));
    }

    if trimmed.ends_with('-') {
        return Err(BindingParseError::TrailingHyphen);
    }

    let parts: Vec<&str> = trimmed.split('-').collect();
    let (key_str, modifier_parts) = match parts.split_last() {
        Some(split) => split,
        None => return Err(BindingParseError::EmptyInput),
    };

    let key: Key = key_str.parse().map_err(BindingParseError::InvalidKey)?;

    let mut modifiers = ModifierSet::new();
    for modifier_str in modifier_parts {
        let modifier = Modifier::parse(modifier_str)
            .map_err(|_| BindingParseError::UnknownModifier(modifier_str.to_string()))?;
        modifiers.insert(modifier);
    }

    Ok(OutputBinding { key, modifiers })
}

/// Parse the `[key, modifiers]` binding form
pub fn parse_binding_pair(key: &str, modifiers: &str) -> Result<OutputBinding, BindingParseError> {
    let key: Key = key.parse().map_err(BindingParseError::InvalidKey)?;
    let modifiers = ModifierSet::parse(modifiers)
        .map_err(|_| BindingParseError::UnknownModifier(modifiers.trim().to_string()))?;
    Ok(OutputBinding { key, modifiers })
}
