// Homerow Layer Pass
// Layer trigger state machines, layer bindings and swallow rules

use super::{Pass, PassContext};
use crate::config::{LayerDefinition, OutputBinding};
use crate::rule::{Action, KeyOutput, Rule, RuleKind};
use crate::state::StateVar;

/// Generates layer rules for a key.
///
/// A trigger key gets its hold-to-activate state machine. Any other key
/// gets one binding rule per layer that maps it, then one swallow rule
/// per layer that does not.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayerPass;

impl Pass for LayerPass {
    fn name(&self) -> &'static str {
        "layers"
    }

    fn apply(&self, ctx: &PassContext<'_>) -> Vec<Rule> {
        match ctx.config.layer_triggered_by(ctx.key.name()) {
            Some((name, layer)) => trigger_rules(ctx, name, layer),
            None => binding_rules(ctx),
        }
    }
}

fn trigger_rules(ctx: &PassContext<'_>, name: &str, layer: &LayerDefinition) -> Vec<Rule> {
    let active = StateVar::active(name);
    let threshold = ctx.config.timing.layer_hold_threshold_ms;

    // Only the immediate parent gates the trigger
    let parent_active = layer.parent.as_deref().map(StateVar::active);

    let activation = |rule: Rule| {
        rule.then(Action::set(active.clone(), 0))
            .then(Action::set_when_held(active.clone(), 1, threshold))
            .then(Action::set_on_release(active.clone(), 0))
            .then(Action::EmitIfAlone(KeyOutput::plain(ctx.key)))
    };

    let gated = |kind: RuleKind| {
        let rule = Rule::new(kind, ctx.bare());
        match &parent_active {
            Some(parent) => rule.when(parent.clone(), 1),
            None => rule,
        }
    };

    let mut rules: Vec<Rule> = ctx
        .config
        .hrm
        .keys()
        .map(|h| {
            let rollover = gated(RuleKind::TriggerRollover)
                .when(StateVar::held(h), 1)
                .when(StateVar::held_ready(h), 0)
                .when(StateVar::outputted(h), 0)
                .then_all(ctx.streak())
                .then(Action::emit(h))
                .then(Action::set(StateVar::outputted(h), 1));
            activation(rollover)
        })
        .collect();

    rules.push(activation(gated(RuleKind::Trigger).then_all(ctx.streak())));

    log::trace!(
        "layer '{}' trigger '{}': {} rules",
        name,
        ctx.key,
        rules.len()
    );
    rules
}

/// Layers with a parent first; declaration order is kept among equals
fn children_first<'c>(ctx: &PassContext<'c>) -> Vec<(&'c String, &'c LayerDefinition)> {
    let mut layers: Vec<_> = ctx.config.layers.iter().collect();
    layers.sort_by_key(|(_, layer)| layer.parent.is_none());
    layers
}

/// The binding `layer` applies to the current key, direct or inherited
fn resolve<'c>(ctx: &PassContext<'c>, layer: &'c LayerDefinition) -> Option<&'c OutputBinding> {
    if let Some(binding) = layer.bindings.get(ctx.key) {
        return Some(binding);
    }
    if !layer.inherit {
        return None;
    }
    layer
        .parent
        .as_deref()
        .and_then(|parent| ctx.config.layers.get(parent))
        .and_then(|parent| parent.bindings.get(ctx.key))
}

fn binding_rules(ctx: &PassContext<'_>) -> Vec<Rule> {
    let layers = children_first(ctx);
    let mut rules = Vec::new();

    for (name, layer) in &layers {
        let Some(binding) = resolve(ctx, layer) else {
            continue;
        };

        let mut rule = Rule::new(RuleKind::LayerBinding, ctx.bare())
            .when(StateVar::active(name), 1);
        if !layer.handoff {
            if let Some(parent) = &layer.parent {
                rule = rule.when(StateVar::active(parent), 1);
            }
        }

        rules.push(rule.then_all(ctx.streak()).then(Action::Emit(
            KeyOutput::with_modifiers(&binding.key, binding.modifiers.clone()),
        )));
    }

    // Layers are opaque: an unbound key does nothing while the layer is active
    for (name, layer) in &layers {
        if resolve(ctx, layer).is_none() && layer.trigger != *ctx.key {
            rules.push(
                Rule::new(RuleKind::LayerSwallow, ctx.bare())
                    .when(StateVar::active(name), 1)
                    .then(Action::Swallow),
            );
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::test_support::{qwerty_config, run_pass};
    use crate::config::Config;
    use crate::modifier::Modifier;
    use crate::rule::Condition;
    use crate::streak::starts_with_streak_updates;
    use crate::Key;

    fn nav_config() -> Config {
        qwerty_config().with_layer(
            "nav",
            LayerDefinition::new("spacebar")
                .bind("j", OutputBinding::key("left_arrow"))
                .bind("k", OutputBinding::key("down_arrow"))
                .bind("l", OutputBinding::key("right_arrow"))
                .bind("i", OutputBinding::key("up_arrow"))
                .bind("u", OutputBinding::with_modifier("left_arrow", Modifier::Command))
                .bind("d", OutputBinding::key("delete_or_backspace")),
        )
    }

    fn with_select(config: Config, handoff: bool, inherit: bool) -> Config {
        config.with_layer(
            "select",
            LayerDefinition::new("f")
                .with_parent("nav")
                .with_handoff(handoff)
                .with_inherit(inherit)
                .bind("k", OutputBinding::with_modifier("down_arrow", Modifier::Shift)),
        )
    }

    #[test]
    fn test_binding_rule() {
        let rules = run_pass(&LayerPass, &nav_config(), "j");
        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.kind(), RuleKind::LayerBinding);
        assert_eq!(rule.conditions(), &[Condition::new(StateVar::active("nav"), 1)]);
        assert!(starts_with_streak_updates(rule.actions()));
        assert_eq!(rule.outputs().next().unwrap().to_string(), "left_arrow");
    }

    #[test]
    fn test_binding_with_modifier() {
        let rules = run_pass(&LayerPass, &nav_config(), "u");
        assert_eq!(rules[0].outputs().next().unwrap().to_string(), "⌘left_arrow");
    }

    #[test]
    fn test_unbound_key_is_swallowed() {
        let rules = run_pass(&LayerPass, &nav_config(), "q");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind(), RuleKind::LayerSwallow);
        assert_eq!(rules[0].actions(), &[Action::Swallow]);
        assert_eq!(rules[0].outputs().count(), 0);
    }

    #[test]
    fn test_trigger_rules() {
        let config = nav_config();
        let rules = run_pass(&LayerPass, &config, "spacebar");
        assert_eq!(rules.len(), config.hrm.len() + 1);

        let (rollover, plain) = rules.split_at(config.hrm.len());
        assert!(rollover.iter().all(|r| r.kind() == RuleKind::TriggerRollover));

        let a = Key::from("a");
        assert_eq!(
            rollover[0].conditions(),
            &[
                Condition::new(StateVar::held(&a), 1),
                Condition::new(StateVar::held_ready(&a), 0),
                Condition::new(StateVar::outputted(&a), 0),
            ]
        );
        assert_eq!(rollover[0].outputs().next().unwrap().key, "a");
        assert!(rollover[0]
            .actions()
            .contains(&Action::set(StateVar::outputted(&a), 1)));

        let trigger = &plain[0];
        assert_eq!(trigger.kind(), RuleKind::Trigger);
        assert!(trigger.conditions().is_empty());
        assert!(starts_with_streak_updates(trigger.actions()));
        assert!(trigger
            .actions()
            .contains(&Action::set_when_held(StateVar::active("nav"), 1, 120)));
        assert_eq!(
            trigger.actions().last(),
            Some(&Action::EmitIfAlone(KeyOutput::plain(&Key::from("spacebar"))))
        );

        for rule in &rules {
            assert!(!rule.arms_hold_without_reset());
        }
    }

    #[test]
    fn test_child_trigger_gated_on_parent() {
        let config = with_select(nav_config(), true, false);
        let rules = run_pass(&LayerPass, &config, "f");
        for rule in &rules {
            assert_eq!(
                rule.conditions()[0],
                Condition::new(StateVar::active("nav"), 1)
            );
        }
        assert_eq!(rules.last().unwrap().conditions().len(), 1);
    }

    #[test]
    fn test_children_before_parents() {
        let config = with_select(nav_config(), true, false);
        let rules = run_pass(&LayerPass, &config, "k");
        let gates: Vec<String> = rules
            .iter()
            .map(|r| r.conditions()[0].var.to_string())
            .collect();
        assert_eq!(gates, vec!["selectActive", "navActive"]);
        assert_eq!(rules[0].outputs().next().unwrap().to_string(), "⇧down_arrow");
    }

    #[test]
    fn test_no_handoff_requires_parent_active() {
        let config = with_select(nav_config(), false, false);
        let rules = run_pass(&LayerPass, &config, "k");
        assert_eq!(
            rules[0].conditions(),
            &[
                Condition::new(StateVar::active("select"), 1),
                Condition::new(StateVar::active("nav"), 1),
            ]
        );
    }

    #[test]
    fn test_inherit_resolves_parent_binding() {
        let inheriting = with_select(nav_config(), true, true);
        let rules = run_pass(&LayerPass, &inheriting, "j");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].conditions()[0].var, StateVar::active("select"));
        assert_eq!(rules[0].outputs().next().unwrap().to_string(), "left_arrow");
        assert_eq!(rules[1].conditions()[0].var, StateVar::active("nav"));

        let opaque = with_select(nav_config(), true, false);
        let rules = run_pass(&LayerPass, &opaque, "j");
        let kinds: Vec<RuleKind> = rules.iter().map(Rule::kind).collect();
        assert_eq!(kinds, vec![RuleKind::LayerBinding, RuleKind::LayerSwallow]);
        assert_eq!(rules[1].conditions()[0].var, StateVar::active("select"));
    }

    #[test]
    fn test_no_layers_no_rules() {
        assert!(run_pass(&LayerPass, &qwerty_config(), "j").is_empty());
    }
}
