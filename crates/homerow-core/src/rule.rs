// Homerow Rule Model
// Compiled rules: a key match, conjunctive conditions and an ordered action list

use std::fmt;

use smallvec::SmallVec;
use strum_macros::{Display, EnumIter};

use crate::modifier::{Modifier, ModifierSet};
use crate::state::StateVar;
use crate::Key;

/// Which modifiers must be physically down for a rule to match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierMatch {
    /// No modifiers held
    Bare,
    /// Exactly this modifier held
    Mandatory(Modifier),
}

/// The event side of a rule
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyMatch {
    pub key: Key,
    pub modifiers: ModifierMatch,
}

impl KeyMatch {
    /// Match the key with no modifiers held, so chords like Ctrl+X reach the OS untouched
    pub fn bare(key: &Key) -> Self {
        Self {
            key: key.clone(),
            modifiers: ModifierMatch::Bare,
        }
    }

    /// Match the key while a physical modifier is held
    pub fn with_modifier(key: &Key, modifier: Modifier) -> Self {
        Self {
            key: key.clone(),
            modifiers: ModifierMatch::Mandatory(modifier),
        }
    }

    pub fn is_bare(&self) -> bool {
        self.modifiers == ModifierMatch::Bare
    }
}

impl fmt::Display for KeyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.modifiers {
            ModifierMatch::Bare => write!(f, "{}", self.key),
            ModifierMatch::Mandatory(m) => write!(f, "{}{}", m, self.key),
        }
    }
}

/// A key to emit, with the modifiers to hold while emitting it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyOutput {
    pub key: Key,
    pub modifiers: ModifierSet,
}

impl KeyOutput {
    pub fn plain(key: &Key) -> Self {
        Self {
            key: key.clone(),
            modifiers: ModifierSet::new(),
        }
    }

    pub fn with_modifiers(key: &Key, modifiers: ModifierSet) -> Self {
        Self {
            key: key.clone(),
            modifiers,
        }
    }
}

impl fmt::Display for KeyOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.modifiers, self.key)
    }
}

/// A value computed by the engine when an action runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Expression {
    /// 1 if the streak window has not yet expired, else 0
    StreakActive,
    /// The engine clock plus this many milliseconds
    NowPlus(u64),
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::StreakActive => write!(
                f,
                "if({} > system.now.milliseconds, 1, 0)",
                StateVar::StreakExpiry
            ),
            Expression::NowPlus(ms) => write!(f, "system.now.milliseconds + {}", ms),
        }
    }
}

/// The right-hand side of a variable write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    Int(i64),
    Expr(Expression),
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<Expression> for Value {
    fn from(expr: Expression) -> Self {
        Value::Expr(expr)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Expr(e) => write!(f, "{}", e),
        }
    }
}

/// A required variable equality; all of a rule's conditions must hold
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    pub var: StateVar,
    pub value: i64,
}

impl Condition {
    pub fn new(var: StateVar, value: i64) -> Self {
        Self { var, value }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} == {}", self.var, self.value)
    }
}

/// One step of a rule's action sequence.
///
/// `SetVarWhenHeld` is a timer armed on key-down that fires only if the
/// key is still down at `threshold_ms`. `SetVarOnRelease` fires once on
/// key-up. `EmitIfAlone` fires on key-up only if no other key was pressed
/// and no hold timer fired in between.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    SetVar {
        var: StateVar,
        value: Value,
    },
    Emit(KeyOutput),
    /// Consume the event without output
    Swallow,
    SetVarWhenHeld {
        var: StateVar,
        value: Value,
        threshold_ms: u64,
    },
    SetVarOnRelease {
        var: StateVar,
        value: Value,
    },
    EmitIfAlone(KeyOutput),
}

impl Action {
    pub fn set(var: StateVar, value: impl Into<Value>) -> Self {
        Action::SetVar {
            var,
            value: value.into(),
        }
    }

    pub fn set_when_held(var: StateVar, value: impl Into<Value>, threshold_ms: u64) -> Self {
        Action::SetVarWhenHeld {
            var,
            value: value.into(),
            threshold_ms,
        }
    }

    pub fn set_on_release(var: StateVar, value: impl Into<Value>) -> Self {
        Action::SetVarOnRelease {
            var,
            value: value.into(),
        }
    }

    pub fn emit(key: &Key) -> Self {
        Action::Emit(KeyOutput::plain(key))
    }

    /// The variable this action writes, if any
    pub fn var(&self) -> Option<&StateVar> {
        match self {
            Action::SetVar { var, .. }
            | Action::SetVarWhenHeld { var, .. }
            | Action::SetVarOnRelease { var, .. } => Some(var),
            Action::Emit(_) | Action::Swallow | Action::EmitIfAlone(_) => None,
        }
    }

    /// True for actions that send a key to the OS
    pub fn is_output(&self) -> bool {
        matches!(self, Action::Emit(_) | Action::EmitIfAlone(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SetVar { var, value } => write!(f, "set {} = {}", var, value),
            Action::Emit(output) => write!(f, "emit {}", output),
            Action::Swallow => write!(f, "swallow"),
            Action::SetVarWhenHeld {
                var,
                value,
                threshold_ms,
            } => write!(f, "after {}ms held: set {} = {}", threshold_ms, var, value),
            Action::SetVarOnRelease { var, value } => {
                write!(f, "on release: set {} = {}", var, value)
            }
            Action::EmitIfAlone(output) => write!(f, "if alone: emit {}", output),
        }
    }
}

/// The compiler stage that produces a rule, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Layer,
    Hrm,
    Default,
}

/// Which part of the compiler produced a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum RuleKind {
    /// Layer trigger pressed while a home-row key is mid-roll
    TriggerRollover,
    Trigger,
    LayerBinding,
    LayerSwallow,
    HrmActivation,
    HrmRollover,
    SameHandRollover,
    ModifierPassthrough,
    HrmSource,
    Passthrough,
}

impl RuleKind {
    pub fn stage(self) -> Stage {
        match self {
            RuleKind::TriggerRollover
            | RuleKind::Trigger
            | RuleKind::LayerBinding
            | RuleKind::LayerSwallow => Stage::Layer,
            RuleKind::HrmActivation
            | RuleKind::HrmRollover
            | RuleKind::SameHandRollover
            | RuleKind::ModifierPassthrough
            | RuleKind::HrmSource => Stage::Hrm,
            RuleKind::Passthrough => Stage::Default,
        }
    }
}

/// One compiled rule.
///
/// Rules are values: build them by composing conditions and actions onto
/// a fresh rule, then hand them to the rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    kind: RuleKind,
    matcher: KeyMatch,
    conditions: SmallVec<[Condition; 4]>,
    actions: Vec<Action>,
}

impl Rule {
    pub fn new(kind: RuleKind, matcher: KeyMatch) -> Self {
        Self {
            kind,
            matcher,
            conditions: SmallVec::new(),
            actions: Vec::new(),
        }
    }

    /// Add a required variable equality
    pub fn when(mut self, var: StateVar, value: i64) -> Self {
        self.conditions.push(Condition::new(var, value));
        self
    }

    /// Append an action
    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn then_all(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn matcher(&self) -> &KeyMatch {
        &self.matcher
    }

    pub fn key(&self) -> &Key {
        &self.matcher.key
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Every key this rule can send, in action order
    pub fn outputs(&self) -> impl Iterator<Item = &KeyOutput> {
        self.actions.iter().filter_map(|action| match action {
            Action::Emit(output) | Action::EmitIfAlone(output) => Some(output),
            _ => None,
        })
    }

    /// Every state variable read or written by this rule
    pub fn state_vars(&self) -> impl Iterator<Item = &StateVar> {
        self.conditions
            .iter()
            .map(|c| &c.var)
            .chain(self.actions.iter().filter_map(Action::var))
    }

    /// True if a hold-threshold write has no release reset of the same
    /// variable in this rule, which would let a short tap reach the held
    /// state.
    pub fn arms_hold_without_reset(&self) -> bool {
        self.actions.iter().any(|action| match action {
            Action::SetVarWhenHeld { var, .. } => !self.actions.iter().any(|other| {
                matches!(other, Action::SetVarOnRelease { var: reset, .. } if reset == var)
            }),
            _ => false,
        })
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.matcher)?;
        if !self.conditions.is_empty() {
            let conditions: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
            write!(f, " when {}", conditions.join(" && "))?;
        }
        let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
        write!(f, " -> {}", actions.join(", "))
    }
}

/// The ordered rules for one key. Earlier rules take priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    key: Key,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(key: Key, rules: Vec<Rule>) -> Self {
        Self { key, rules }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Count the rules of one kind
    pub fn count(&self, kind: RuleKind) -> usize {
        self.rules.iter().filter(|r| r.kind() == kind).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} rules)", self.key, self.rules.len())?;
        for (i, rule) in self.rules.iter().enumerate() {
            writeln!(f, "  {:>3}. {}", i + 1, rule)?;
        }
        Ok(())
    }
}
