// Homerow Config API
// In-process configuration, TOML loading, binding parsing and validation

pub mod binding_parser;
pub mod parser;
pub mod validate;

use indexmap::IndexMap;

use crate::modifier::{Modifier, ModifierSet};
use crate::Key;

pub use binding_parser::{parse_binding_string, BindingParseError};
pub use parser::{ConfigError, ConfigToml};
pub use validate::Diagnostic;

pub const DEFAULT_STREAK_WINDOW_MS: u64 = 150;
pub const DEFAULT_HRM_HOLD_THRESHOLD_MS: u64 = 150;
pub const DEFAULT_LAYER_HOLD_THRESHOLD_MS: u64 = 120;

/// Timing thresholds, all in milliseconds.
///
/// The two hold thresholds are independent; nothing assumes they match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Rolling window after any keypress during which typing is assumed
    pub streak_window_ms: u64,
    /// How long a home-row key must be held before it acts as a modifier
    pub hrm_hold_threshold_ms: u64,
    /// How long a layer trigger must be held before the layer activates
    pub layer_hold_threshold_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            streak_window_ms: DEFAULT_STREAK_WINDOW_MS,
            hrm_hold_threshold_ms: DEFAULT_HRM_HOLD_THRESHOLD_MS,
            layer_hold_threshold_ms: DEFAULT_LAYER_HOLD_THRESHOLD_MS,
        }
    }
}

/// What a layer binding sends: a key plus optional modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputBinding {
    pub key: Key,
    pub modifiers: ModifierSet,
}

impl OutputBinding {
    pub fn key(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            modifiers: ModifierSet::new(),
        }
    }

    pub fn with_modifier(key: impl Into<Key>, modifier: Modifier) -> Self {
        Self {
            key: key.into(),
            modifiers: ModifierSet::single(modifier),
        }
    }
}

/// A named alternate mapping activated by holding a trigger key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDefinition {
    pub trigger: Key,
    /// Layer that must be active for this layer's trigger to work
    pub parent: Option<String>,
    /// When false, bindings only apply while the parent is also active
    pub handoff: bool,
    /// When true, keys this layer does not bind fall back to the parent's bindings
    pub inherit: bool,
    pub bindings: IndexMap<Key, OutputBinding>,
}

impl LayerDefinition {
    pub fn new(trigger: impl Into<Key>) -> Self {
        Self {
            trigger: trigger.into(),
            parent: None,
            handoff: true,
            inherit: false,
            bindings: IndexMap::new(),
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_handoff(mut self, handoff: bool) -> Self {
        self.handoff = handoff;
        self
    }

    pub fn with_inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    pub fn bind(mut self, key: impl Into<Key>, output: OutputBinding) -> Self {
        self.bindings.insert(key.into(), output);
        self
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Visual layout rows, e.g. `"q w e r t | y u i o p"`
    pub layout: Vec<String>,
    /// Home-row modifier assignments, in declaration order
    pub hrm: IndexMap<Key, Modifier>,
    /// Layers by name, in declaration order
    pub layers: IndexMap<String, LayerDefinition>,
    pub timing: Timing,
}

impl Config {
    pub fn new<S: AsRef<str>>(layout: &[S]) -> Self {
        Self {
            layout: layout.iter().map(|row| row.as_ref().to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_hrm(mut self, key: impl Into<Key>, modifier: Modifier) -> Self {
        self.hrm.insert(key.into(), modifier);
        self
    }

    pub fn with_layer(mut self, name: impl Into<String>, layer: LayerDefinition) -> Self {
        self.layers.insert(name.into(), layer);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Check the whole configuration.
    ///
    /// Returns the non-fatal diagnostics on success.
    pub fn validate(&self) -> Result<Vec<Diagnostic>, ConfigError> {
        validate::check(self).map(|validated| validated.diagnostics)
    }

    /// The layer whose trigger is `key`, if any
    pub fn layer_triggered_by(&self, key: &str) -> Option<(&str, &LayerDefinition)> {
        self.layers
            .iter()
            .find(|(_, layer)| layer.trigger == key)
            .map(|(name, layer)| (name.as_str(), layer))
    }

    pub fn is_hrm_key(&self, key: &str) -> bool {
        self.hrm.contains_key(key)
    }
}
