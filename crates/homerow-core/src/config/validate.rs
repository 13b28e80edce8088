// Homerow Config Validation
// Fatal checks on a Config plus non-fatal diagnostics

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::{Config, ConfigError};
use crate::layout::KeyboardLayout;
use crate::Key;

/// Upper bound on home-row modifier keys; activation rules grow as 2^n
pub const MAX_HRM_KEYS: usize = 16;

/// Accepted range for every timing value, in milliseconds
pub const TIMING_RANGE_MS: std::ops::RangeInclusive<u64> = 1..=5000;

fn layer_name_pattern() -> &'static Regex {
    static LAYER_NAME: OnceLock<Regex> = OnceLock::new();
    LAYER_NAME.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("layer name pattern is valid")
    })
}

/// A non-fatal finding about a configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A layer trigger is also a home-row modifier key
    TriggerIsHrmKey { layer: String, key: Key },
    /// A layer binds a key that triggers another layer; the binding can never fire
    BindingOnTrigger {
        layer: String,
        key: Key,
        trigger_of: String,
    },
    /// A layer binds a key that is neither in the layout nor a trigger; no rules are
    /// generated for it, so the binding is ignored
    BindingOffLayout { layer: String, key: Key },
    /// `handoff` or `inherit` set on a layer without a parent has no effect
    ParentFlagWithoutParent { layer: String, flag: &'static str },
    /// The two hold thresholds are independent and are left as configured
    HoldThresholdsDiffer { hrm_ms: u64, layer_ms: u64 },
}

impl Diagnostic {
    /// Log level the compiler reports this diagnostic at
    pub fn level(&self) -> log::Level {
        match self {
            Diagnostic::HoldThresholdsDiffer { .. } => log::Level::Debug,
            _ => log::Level::Warn,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TriggerIsHrmKey { layer, key } => write!(
                f,
                "layer '{}' is triggered by '{}', which is also a home-row modifier; the layer rules take priority",
                layer, key
            ),
            Diagnostic::BindingOnTrigger {
                layer,
                key,
                trigger_of,
            } => write!(
                f,
                "layer '{}' binds '{}', which triggers layer '{}'; the binding is unreachable",
                layer, key, trigger_of
            ),
            Diagnostic::BindingOffLayout { layer, key } => write!(
                f,
                "layer '{}' binds '{}', which is neither in the layout nor a trigger; the binding is ignored",
                layer, key
            ),
            Diagnostic::ParentFlagWithoutParent { layer, flag } => write!(
                f,
                "layer '{}' sets '{}' but has no parent",
                layer, flag
            ),
            Diagnostic::HoldThresholdsDiffer { hrm_ms, layer_ms } => write!(
                f,
                "hold thresholds differ: home-row {}ms, layer {}ms",
                hrm_ms, layer_ms
            ),
        }
    }
}

/// A configuration that passed every fatal check
#[derive(Debug)]
pub(crate) struct Validated {
    pub layout: KeyboardLayout,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) fn check(config: &Config) -> Result<Validated, ConfigError> {
    check_timing(config)?;

    let layout = KeyboardLayout::parse(&config.layout)?;

    if config.hrm.len() > MAX_HRM_KEYS {
        return Err(ConfigError::TooManyHrmKeys {
            count: config.hrm.len(),
            max: MAX_HRM_KEYS,
        });
    }
    for key in config.hrm.keys() {
        if !layout.contains(key.name()) {
            return Err(ConfigError::HrmKeyNotInLayout { key: key.clone() });
        }
    }

    check_layers(config)?;

    let diagnostics = collect_diagnostics(config, &layout);
    Ok(Validated {
        layout,
        diagnostics,
    })
}

fn check_timing(config: &Config) -> Result<(), ConfigError> {
    let timing = &config.timing;
    for (name, value) in [
        ("streak_window_ms", timing.streak_window_ms),
        ("hrm_hold_threshold_ms", timing.hrm_hold_threshold_ms),
        ("layer_hold_threshold_ms", timing.layer_hold_threshold_ms),
    ] {
        if !TIMING_RANGE_MS.contains(&value) {
            return Err(ConfigError::TimeoutOutOfRange(format!(
                "{} = {} (must be {}..={})",
                name,
                value,
                TIMING_RANGE_MS.start(),
                TIMING_RANGE_MS.end()
            )));
        }
    }
    Ok(())
}

/// Builder-made keys skip the TOML parser, so hold them to the same rules
fn check_key(key: &Key) -> Result<(), ConfigError> {
    let parsed: Key = key.name().parse().map_err(ConfigError::InvalidKey)?;
    if parsed != *key {
        return Err(ConfigError::InvalidKey(format!(
            "key name has surrounding whitespace: '{}'",
            key
        )));
    }
    Ok(())
}

fn check_layers(config: &Config) -> Result<(), ConfigError> {
    for (name, layer) in &config.layers {
        if !layer_name_pattern().is_match(name) {
            return Err(ConfigError::InvalidLayerName(name.clone()));
        }
        check_key(&layer.trigger)?;
        for (key, output) in &layer.bindings {
            check_key(key)?;
            check_key(&output.key)?;
        }
        if let Some(parent) = &layer.parent {
            if !config.layers.contains_key(parent) {
                return Err(ConfigError::UnknownParent {
                    layer: name.clone(),
                    parent: parent.clone(),
                });
            }
        }
    }

    for name in config.layers.keys() {
        let mut seen = HashSet::new();
        let mut current = Some(name.as_str());
        while let Some(layer_name) = current {
            if !seen.insert(layer_name) {
                return Err(ConfigError::ParentCycle {
                    layer: name.clone(),
                });
            }
            current = config
                .layers
                .get(layer_name)
                .and_then(|layer| layer.parent.as_deref());
        }
    }

    for (i, (name, layer)) in config.layers.iter().enumerate() {
        if let Some((first, _)) = config
            .layers
            .iter()
            .take(i)
            .find(|(_, earlier)| earlier.trigger == layer.trigger)
        {
            return Err(ConfigError::DuplicateTrigger {
                key: layer.trigger.clone(),
                first: first.clone(),
                second: name.clone(),
            });
        }
    }

    Ok(())
}

fn collect_diagnostics(config: &Config, layout: &KeyboardLayout) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (name, layer) in &config.layers {
        if config.is_hrm_key(layer.trigger.name()) {
            diagnostics.push(Diagnostic::TriggerIsHrmKey {
                layer: name.clone(),
                key: layer.trigger.clone(),
            });
        }

        if layer.parent.is_none() {
            if !layer.handoff {
                diagnostics.push(Diagnostic::ParentFlagWithoutParent {
                    layer: name.clone(),
                    flag: "handoff",
                });
            }
            if layer.inherit {
                diagnostics.push(Diagnostic::ParentFlagWithoutParent {
                    layer: name.clone(),
                    flag: "inherit",
                });
            }
        }

        for key in layer.bindings.keys() {
            if let Some((trigger_of, _)) = config.layer_triggered_by(key.name()) {
                diagnostics.push(Diagnostic::BindingOnTrigger {
                    layer: name.clone(),
                    key: key.clone(),
                    trigger_of: trigger_of.to_string(),
                });
            } else if !layout.contains(key.name()) {
                diagnostics.push(Diagnostic::BindingOffLayout {
                    layer: name.clone(),
                    key: key.clone(),
                });
            }
        }
    }

    let timing = config.timing;
    if timing.hrm_hold_threshold_ms != timing.layer_hold_threshold_ms {
        diagnostics.push(Diagnostic::HoldThresholdsDiffer {
            hrm_ms: timing.hrm_hold_threshold_ms,
            layer_ms: timing.layer_hold_threshold_ms,
        });
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LayerDefinition, OutputBinding, Timing};
    use crate::layout::LayoutError;
    use crate::modifier::Modifier;

    const ROWS: [&str; 2] = ["q w e r t | y u i o p", "a s d f g | h j k l ;"];

    fn base() -> Config {
        Config::new(&ROWS)
            .with_hrm("a", Modifier::Control)
            .with_hrm("j", Modifier::Shift)
    }

    fn equal_thresholds() -> Timing {
        Timing {
            streak_window_ms: 150,
            hrm_hold_threshold_ms: 150,
            layer_hold_threshold_ms: 150,
        }
    }

    #[test]
    fn test_valid_config_has_only_threshold_diagnostic() {
        let config = base().with_layer(
            "nav",
            LayerDefinition::new("spacebar").bind("h", OutputBinding::key("left_arrow")),
        );
        let diagnostics = config.validate().unwrap();
        assert_eq!(
            diagnostics,
            vec![Diagnostic::HoldThresholdsDiffer {
                hrm_ms: 150,
                layer_ms: 120
            }]
        );
        assert_eq!(diagnostics[0].level(), log::Level::Debug);
    }

    #[test]
    fn test_equal_thresholds_are_silent() {
        let config = base().with_timing(equal_thresholds());
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_timing_bounds() {
        let mut timing = equal_thresholds();
        timing.layer_hold_threshold_ms = 5001;
        let err = base().with_timing(timing).validate().unwrap_err();
        assert!(matches!(err, ConfigError::TimeoutOutOfRange(_)));
        assert!(err.to_string().contains("layer_hold_threshold_ms"));

        timing.layer_hold_threshold_ms = 5000;
        assert!(base().with_timing(timing).validate().is_ok());
    }

    #[test]
    fn test_layout_errors_are_fatal() {
        let config = Config::new(&["a s d | j k a"]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Layout(LayoutError::DuplicateKey { .. }))
        ));
    }

    #[test]
    fn test_hrm_key_must_be_in_layout() {
        let config = base().with_hrm("spacebar", Modifier::Alt);
        match config.validate() {
            Err(ConfigError::HrmKeyNotInLayout { key }) => assert_eq!(key, "spacebar"),
            other => panic!("expected HrmKeyNotInLayout, got {:?}", other),
        }
    }

    #[test]
    fn test_too_many_hrm_keys() {
        let left: Vec<String> = (0..9).map(|i| format!("l{}", i)).collect();
        let right: Vec<String> = (0..9).map(|i| format!("r{}", i)).collect();
        let row = format!("{} | {}", left.join(" "), right.join(" "));
        let mut config = Config::new(&[row]);
        for key in left.iter().chain(right.iter()) {
            config = config.with_hrm(key.as_str(), Modifier::Shift);
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooManyHrmKeys { count: 18, max: 16 })
        ));
    }

    #[test]
    fn test_layer_names() {
        for bad in ["1nav", "nav-layer", "", "nav layer"] {
            let config = base().with_layer(bad, LayerDefinition::new("spacebar"));
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidLayerName(_))),
                "'{}' should be rejected",
                bad
            );
        }
        for good in ["nav", "_sym", "Num2"] {
            let config = base().with_layer(good, LayerDefinition::new("spacebar"));
            assert!(config.validate().is_ok(), "'{}' should be accepted", good);
        }
    }

    #[test]
    fn test_unknown_parent() {
        let config = base().with_layer("sel", LayerDefinition::new("d").with_parent("nav"));
        match config.validate() {
            Err(ConfigError::UnknownParent { layer, parent }) => {
                assert_eq!(layer, "sel");
                assert_eq!(parent, "nav");
            }
            other => panic!("expected UnknownParent, got {:?}", other),
        }
    }

    #[test]
    fn test_parent_cycles() {
        let self_parent = base().with_layer("nav", LayerDefinition::new("spacebar").with_parent("nav"));
        assert!(matches!(
            self_parent.validate(),
            Err(ConfigError::ParentCycle { .. })
        ));

        let pair = base()
            .with_layer("one", LayerDefinition::new("spacebar").with_parent("two"))
            .with_layer("two", LayerDefinition::new("caps_lock").with_parent("one"));
        assert!(matches!(pair.validate(), Err(ConfigError::ParentCycle { .. })));
    }

    #[test]
    fn test_duplicate_trigger() {
        let config = base()
            .with_layer("nav", LayerDefinition::new("spacebar"))
            .with_layer("num", LayerDefinition::new("spacebar"));
        match config.validate() {
            Err(ConfigError::DuplicateTrigger { key, first, second }) => {
                assert_eq!(key, "spacebar");
                assert_eq!(first, "nav");
                assert_eq!(second, "num");
            }
            other => panic!("expected DuplicateTrigger, got {:?}", other),
        }
    }

    #[test]
    fn test_warning_diagnostics() {
        let config = base()
            .with_timing(equal_thresholds())
            .with_layer(
                "nav",
                LayerDefinition::new("spacebar")
                    .with_inherit(true)
                    .bind("f", OutputBinding::key("x"))
                    .bind("tab", OutputBinding::key("escape")),
            )
            .with_layer(
                "sel",
                LayerDefinition::new("a")
                    .with_parent("nav")
                    .bind("spacebar", OutputBinding::key("return_or_enter")),
            );

        let diagnostics = config.validate().unwrap();
        assert!(diagnostics.contains(&Diagnostic::ParentFlagWithoutParent {
            layer: "nav".to_string(),
            flag: "inherit",
        }));
        assert!(diagnostics.contains(&Diagnostic::BindingOffLayout {
            layer: "nav".to_string(),
            key: Key::from("tab"),
        }));
        assert!(diagnostics.contains(&Diagnostic::TriggerIsHrmKey {
            layer: "sel".to_string(),
            key: Key::from("a"),
        }));
        assert!(diagnostics.contains(&Diagnostic::BindingOnTrigger {
            layer: "sel".to_string(),
            key: Key::from("spacebar"),
            trigger_of: "nav".to_string(),
        }));
        assert!(diagnostics.iter().all(|d| d.level() == log::Level::Warn));
        assert_eq!(diagnostics.len(), 4);
    }

    #[test]
    fn test_builder_keys_are_checked() {
        let empty_trigger = base().with_layer("nav", LayerDefinition::new(""));
        assert!(matches!(
            empty_trigger.validate(),
            Err(ConfigError::InvalidKey(_))
        ));

        let spaced_binding = base().with_layer(
            "nav",
            LayerDefinition::new("spacebar").bind("left arrow", OutputBinding::key("home")),
        );
        assert!(matches!(
            spaced_binding.validate(),
            Err(ConfigError::InvalidKey(_))
        ));

        let spaced_output = base().with_layer(
            "nav",
            LayerDefinition::new("spacebar").bind("h", OutputBinding::key(" left_arrow")),
        );
        assert!(matches!(
            spaced_output.validate(),
            Err(ConfigError::InvalidKey(_))
        ));
    }
}
