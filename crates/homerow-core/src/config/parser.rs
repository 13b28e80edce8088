// Homerow Config Parser - TOML with Serde
// Parses configuration from TOML files

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::Deserialize;

use super::binding_parser::{parse_binding_pair, parse_binding_string};
use super::{Config, LayerDefinition, OutputBinding, Timing};
use crate::layout::LayoutError;
use crate::modifier::Modifier;
use crate::Key;

/// Whether `HOMEROW_DEBUG_CONFIG` asks for verbose config and rule dumps
pub(crate) fn config_debug_enabled() -> bool {
    static DEBUG_CONFIG: OnceLock<bool> = OnceLock::new();
    *DEBUG_CONFIG.get_or_init(|| {
        std::env::var("HOMEROW_DEBUG_CONFIG")
            .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "yes" | "on"))
            .unwrap_or(false)
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid modifier: {0}")]
    InvalidModifier(String),

    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    #[error("Timeout value out of range: {0}")]
    TimeoutOutOfRange(String),

    #[error("Invalid layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("home-row modifier key '{key}' is not in the layout")]
    HrmKeyNotInLayout { key: Key },

    #[error("too many home-row modifier keys: {count} (at most {max})")]
    TooManyHrmKeys { count: usize, max: usize },

    #[error("invalid layer name '{0}': must start with a letter or '_' and contain only letters, digits and '_'")]
    InvalidLayerName(String),

    #[error("layer '{layer}' names parent '{parent}', which is not defined")]
    UnknownParent { layer: String, parent: String },

    #[error("layer '{layer}' is part of a parent cycle")]
    ParentCycle { layer: String },

    #[error("layers '{first}' and '{second}' share the trigger key '{key}'")]
    DuplicateTrigger {
        key: Key,
        first: String,
        second: String,
    },
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Visual layout rows
    pub layout: Vec<String>,

    /// Home-row modifiers: key -> modifier symbol or alias
    #[serde(default)]
    pub hrm: IndexMap<String, String>,

    /// Layers by name
    #[serde(default)]
    pub layers: IndexMap<String, LayerToml>,

    /// Timing thresholds
    #[serde(default)]
    pub timing: Option<TimingConfig>,
}

/// Layer table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerToml {
    pub trigger: String,
    pub parent: Option<String>,
    pub handoff: Option<bool>,
    pub inherit: Option<bool>,
    #[serde(default)]
    pub bindings: IndexMap<String, BindingToml>,
}

/// Output side of a layer binding (supports two formats)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BindingToml {
    /// Key or combo string, e.g. "left_arrow" or "Cmd-left_arrow"
    Single(String),

    /// `[key, modifiers]`, e.g. ["left_arrow", "⌘"]
    Pair(Vec<String>),
}

/// Timing configuration (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    pub streak_window_ms: Option<u64>,
    pub hrm_hold_threshold_ms: Option<u64>,
    pub layer_hold_threshold_ms: Option<u64>,
}

impl Config {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;

        let config = toml_config.to_config()?;
        config.validate()?;
        Ok(config)
    }

    /// Default config location (`<config dir>/homerow/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("homerow").join("config.toml"))
    }
}

impl ConfigToml {
    /// Convert parsed TOML to the internal Config structure
    fn to_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config {
            layout: self.layout.clone(),
            ..Config::default()
        };

        for (key_str, modifier_str) in &self.hrm {
            let key = parse_key(key_str)?;
            let modifier = Modifier::parse(modifier_str).map_err(|e| {
                ConfigError::InvalidModifier(format!("hrm key '{}': {}", key_str, e))
            })?;
            config.hrm.insert(key, modifier);
        }

        for (name, layer_toml) in &self.layers {
            let mut layer = LayerDefinition::new(parse_key(&layer_toml.trigger)?);
            layer.parent = layer_toml.parent.clone();
            if let Some(handoff) = layer_toml.handoff {
                layer.handoff = handoff;
            }
            if let Some(inherit) = layer_toml.inherit {
                layer.inherit = inherit;
            }

            for (key_str, binding) in &layer_toml.bindings {
                let key = parse_key(key_str)?;
                let output = parse_binding(binding).map_err(|reason| {
                    ConfigError::InvalidBinding(format!(
                        "layer '{}' key '{}': {}",
                        name, key_str, reason
                    ))
                })?;
                layer.bindings.insert(key, output);
            }

            log::debug!(
                "Loaded layer '{}' with {} bindings, trigger='{}', parent={:?}",
                name,
                layer.bindings.len(),
                layer.trigger,
                layer.parent
            );

            if config_debug_enabled() {
                for (key, output) in &layer.bindings {
                    log::trace!("  [{}] {} -> {}{}", name, key, output.modifiers, output.key);
                }
            }

            config.layers.insert(name.clone(), layer);
        }

        if let Some(timing) = &self.timing {
            let defaults = Timing::default();
            config.timing = Timing {
                streak_window_ms: timing.streak_window_ms.unwrap_or(defaults.streak_window_ms),
                hrm_hold_threshold_ms: timing
                    .hrm_hold_threshold_ms
                    .unwrap_or(defaults.hrm_hold_threshold_ms),
                layer_hold_threshold_ms: timing
                    .layer_hold_threshold_ms
                    .unwrap_or(defaults.layer_hold_threshold_ms),
            };
        }

        Ok(config)
    }
}

/// Parse a key name into a Key
fn parse_key(name: &str) -> Result<Key, ConfigError> {
    name.parse::<Key>().map_err(ConfigError::InvalidKey)
}

fn parse_binding(binding: &BindingToml) -> Result<OutputBinding, String> {
    match binding {
        BindingToml::Single(s) => parse_binding_string(s).map_err(|e| e.to_string()),
        BindingToml::Pair(parts) => match parts.as_slice() {
            [key] => parse_binding_string(key).map_err(|e| e.to_string()),
            [key, modifiers] => parse_binding_pair(key, modifiers).map_err(|e| e.to_string()),
            _ => Err(format!(
                "expected [key] or [key, modifiers], got {} items",
                parts.len()
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modifier::ModifierSet;

    #[test]
    fn test_config_from_simple_toml() {
        let toml = r#"
            layout = [
                "q w e r t | y u i o p",
                "a s d f g | h j k l ;",
            ]

            [hrm]
            a = "⌃"
            ";" = "ctrl"

            [layers.nav]
            trigger = "spacebar"

            [layers.nav.bindings]
            j = "left_arrow"
            u = "Cmd-left_arrow"
            o = ["right_arrow", "⌘"]
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.layout.len(), 2);
        assert_eq!(config.hrm.get("a"), Some(&Modifier::Control));
        assert_eq!(config.hrm.get(";"), Some(&Modifier::Control));

        let nav = &config.layers["nav"];
        assert_eq!(nav.trigger, "spacebar");
        assert!(nav.handoff);
        assert!(!nav.inherit);
        assert_eq!(nav.bindings["j"], OutputBinding::key("left_arrow"));
        assert_eq!(
            nav.bindings["u"],
            OutputBinding::with_modifier("left_arrow", Modifier::Command)
        );
        assert_eq!(
            nav.bindings["o"].modifiers,
            ModifierSet::single(Modifier::Command)
        );
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn test_config_preserves_declaration_order() {
        let toml = r#"
            layout = ["a s d f | j k l ;"]

            [hrm]
            f = "opt"
            a = "ctrl"
            d = "shift"
        "#;

        let config = Config::from_toml(toml).unwrap();
        let keys: Vec<&str> = config.hrm.keys().map(Key::name).collect();
        assert_eq!(keys, vec!["f", "a", "d"]);
    }

    #[test]
    fn test_config_with_child_layer() {
        let toml = r#"
            layout = ["a s d f | j k l ;"]

            [layers.nav]
            trigger = "spacebar"
            [layers.nav.bindings]
            j = "left_arrow"

            [layers.select]
            trigger = "d"
            parent = "nav"
            handoff = false
            inherit = true
            [layers.select.bindings]
            k = ["down_arrow", "shift"]
        "#;

        let config = Config::from_toml(toml).unwrap();
        let select = &config.layers["select"];
        assert_eq!(select.parent.as_deref(), Some("nav"));
        assert!(!select.handoff);
        assert!(select.inherit);
    }

    #[test]
    fn test_config_timing_overrides() {
        let toml = r#"
            layout = ["a | b"]

            [timing]
            hrm_hold_threshold_ms = 200
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.timing.hrm_hold_threshold_ms, 200);
        assert_eq!(config.timing.streak_window_ms, 150);
        assert_eq!(config.timing.layer_hold_threshold_ms, 120);
    }

    #[test]
    fn test_timing_out_of_range() {
        let toml = r#"
            layout = ["a | b"]

            [timing]
            streak_window_ms = 0
        "#;

        let result = Config::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::TimeoutOutOfRange(_))));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            layout = ["a | b"]
            shift_overrides = { "," = "<" }
        "#;

        let result = Config::from_toml(toml);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_invalid_modifier() {
        let toml = r#"
            layout = ["a | b"]
            [hrm]
            a = "hyper"
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(err.to_string().contains("Invalid modifier"));
        assert!(err.to_string().contains("hyper"));
    }

    #[test]
    fn test_invalid_binding_pair_length() {
        let toml = r#"
            layout = ["a | b"]
            [layers.nav]
            trigger = "spacebar"
            [layers.nav.bindings]
            a = ["left_arrow", "cmd", "shift"]
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBinding(_)));
        assert!(err.to_string().contains("layer 'nav' key 'a'"));
    }

    #[test]
    fn test_layout_error_surfaces() {
        let toml = r#"
            layout = ["a b c"]
        "#;

        let err = Config::from_toml(toml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Layout(LayoutError::MissingDelimiter { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_toml_path("/nonexistent/homerow/config.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        if let Some(path) = Config::default_path() {
            assert!(path.ends_with("homerow/config.toml"));
        }
    }
}
