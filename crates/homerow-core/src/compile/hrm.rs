// Homerow HRM Pass
// Home-row modifier rules: activation, rollover, passthrough and the source state machine

use super::{Pass, PassContext};
use crate::combinations::all_combinations;
use crate::modifier::{Modifier, ModifierSet};
use crate::rule::{Action, KeyMatch, KeyOutput, Rule, RuleKind};
use crate::state::StateVar;
use crate::Key;

/// Generates the home-row modifier rules for a key.
///
/// Every key is a potential target of the opposite hand's modifiers.
/// Home-row keys additionally get the passthrough rules and their own
/// hold state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct HrmPass;

impl Pass for HrmPass {
    fn name(&self) -> &'static str {
        "hrm"
    }

    fn apply(&self, ctx: &PassContext<'_>) -> Vec<Rule> {
        let mut rules = activation(ctx);
        rules.extend(opposite_rollover(ctx));

        if ctx.is_hrm_key() {
            rules.extend(modifier_passthrough(ctx));
            rules.extend(same_hand_rollover(ctx));
            rules.push(source(ctx));
        } else {
            rules.extend(same_hand_rollover(ctx));
        }

        rules
    }
}

/// One rule per subset of held-and-ready opposite-hand keys, largest subsets first
fn activation(ctx: &PassContext<'_>) -> Vec<Rule> {
    let opposite = ctx.opposite_hrm_keys();

    all_combinations(&opposite)
        .into_iter()
        .map(|subset| {
            let modifiers: ModifierSet = subset.iter().map(|&(_, m)| m).collect();
            let mut rule = Rule::new(RuleKind::HrmActivation, ctx.bare())
                .when(StateVar::IsTypingStreak, 0);
            for (h, _) in &subset {
                rule = rule
                    .when(StateVar::held(h), 1)
                    .when(StateVar::held_ready(h), 1);
            }
            rule.then_all(ctx.streak())
                .then(Action::Emit(KeyOutput::with_modifiers(ctx.key, modifiers)))
        })
        .collect()
}

fn opposite_rollover(ctx: &PassContext<'_>) -> Vec<Rule> {
    ctx.opposite_hrm_keys()
        .into_iter()
        .flat_map(|(h, _)| {
            let first = Rule::new(RuleKind::HrmRollover, ctx.bare())
                .when(StateVar::held(h), 1)
                .when(StateVar::held_ready(h), 0)
                .when(StateVar::outputted(h), 0);
            rollover_pair(ctx, h, first, RuleKind::HrmRollover)
        })
        .collect()
}

/// Same-hand chords never become modifiers, so readiness is not checked
fn same_hand_rollover(ctx: &PassContext<'_>) -> Vec<Rule> {
    ctx.same_hand_hrm_keys()
        .into_iter()
        .flat_map(|h| {
            let first = Rule::new(RuleKind::SameHandRollover, ctx.bare())
                .when(StateVar::held(h), 1)
                .when(StateVar::outputted(h), 0);
            rollover_pair(ctx, h, first, RuleKind::SameHandRollover)
        })
        .collect()
}

/// Completes the not-yet-outputted rule and adds its already-outputted twin
fn rollover_pair(ctx: &PassContext<'_>, h: &Key, first: Rule, kind: RuleKind) -> [Rule; 2] {
    let first = first
        .then_all(ctx.streak())
        .then(Action::emit(h))
        .then(Action::emit(ctx.key))
        .then(Action::set(StateVar::outputted(h), 1));

    let second = Rule::new(kind, ctx.bare())
        .when(StateVar::held(h), 1)
        .when(StateVar::outputted(h), 1)
        .then_all(ctx.streak())
        .then(Action::emit(ctx.key));

    [first, second]
}

/// Physical modifier chords on a home-row key go straight through
fn modifier_passthrough(ctx: &PassContext<'_>) -> Vec<Rule> {
    Modifier::all()
        .map(|m| {
            Rule::new(
                RuleKind::ModifierPassthrough,
                KeyMatch::with_modifier(ctx.key, m),
            )
            .then_all(ctx.streak())
            .then(Action::Emit(KeyOutput::with_modifiers(
                ctx.key,
                ModifierSet::single(m),
            )))
        })
        .collect()
}

/// The key's own hold state machine; lowest priority of the HRM rules
fn source(ctx: &PassContext<'_>) -> Rule {
    let key = ctx.key;
    let held = StateVar::held(key);
    let ready = StateVar::held_ready(key);
    let outputted = StateVar::outputted(key);

    Rule::new(RuleKind::HrmSource, ctx.bare())
        .then_all(ctx.streak())
        .then(Action::set(held.clone(), 1))
        .then(Action::set(ready.clone(), 0))
        .then(Action::set(outputted.clone(), 0))
        .then(Action::set_when_held(
            ready.clone(),
            1,
            ctx.config.timing.hrm_hold_threshold_ms,
        ))
        .then(Action::set_on_release(held, 0))
        .then(Action::set_on_release(ready, 0))
        .then(Action::set_on_release(outputted, 0))
        .then(Action::EmitIfAlone(KeyOutput::plain(key)))
}
