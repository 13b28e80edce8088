// Homerow Compile Module
// Rule-generation passes and the orchestrator that runs them per key

pub mod default;
pub mod engine;
pub mod hrm;
pub mod layers;

use indexmap::IndexSet;

use crate::config::Config;
use crate::layout::KeyboardLayout;
use crate::modifier::Modifier;
use crate::rule::{Action, KeyMatch, Rule};
use crate::streak::streak_updates;
use crate::Key;

pub use default::DefaultPass;
pub use engine::{compile, CompileError, CompiledKeymap, Compiler};
pub use hrm::HrmPass;
pub use layers::LayerPass;

/// Everything a pass may read while generating rules for one key
#[derive(Debug, Clone, Copy)]
pub struct PassContext<'a> {
    /// The key being compiled
    pub key: &'a Key,
    pub config: &'a Config,
    pub layout: &'a KeyboardLayout,
    /// Every layer trigger key, in layer declaration order
    pub triggers: &'a IndexSet<Key>,
}

impl<'a> PassContext<'a> {
    pub fn bare(&self) -> KeyMatch {
        KeyMatch::bare(self.key)
    }

    /// The streak-update prefix for an output action sequence
    pub fn streak(&self) -> [Action; 2] {
        streak_updates(self.config.timing.streak_window_ms)
    }

    pub fn is_trigger(&self) -> bool {
        self.triggers.contains(self.key)
    }

    pub fn is_hrm_key(&self) -> bool {
        self.config.is_hrm_key(self.key.name())
    }

    /// Home-row modifier keys on the other hand from the current key, in HRM order
    pub fn opposite_hrm_keys(&self) -> Vec<(&'a Key, Modifier)> {
        self.config
            .hrm
            .iter()
            .filter(|(h, _)| *h != self.key && self.layout.is_opposite_hand(h.name(), self.key.name()))
            .map(|(h, &m)| (h, m))
            .collect()
    }

    /// Home-row modifier keys on the same hand as the current key, excluding itself
    pub fn same_hand_hrm_keys(&self) -> Vec<&'a Key> {
        self.config
            .hrm
            .keys()
            .filter(|h| *h != self.key && !self.layout.is_opposite_hand(h.name(), self.key.name()))
            .collect()
    }
}

/// One rule-generation stage.
///
/// Passes are pure: the same context always yields the same rules.
pub trait Pass: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Rules this pass contributes for `ctx.key`, highest priority first
    fn apply(&self, ctx: &PassContext<'_>) -> Vec<Rule>;
}

/// An ordered list of passes; earlier passes produce higher-priority rules
#[derive(Default)]
pub struct Pipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass
    pub fn pipe(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Run every pass in order and concatenate their rules
    pub fn run(&self, ctx: &PassContext<'_>) -> Vec<Rule> {
        let mut rules = Vec::new();
        for pass in &self.passes {
            let produced = pass.apply(ctx);
            log::trace!(
                "pass '{}' produced {} rules for '{}'",
                pass.name(),
                produced.len(),
                ctx.key
            );
            rules.extend(produced);
        }
        rules
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("passes", &self.names())
            .finish()
    }
}

/// Shorthand for a pipeline starting with `pass`
pub fn pipe(pass: impl Pass + 'static) -> Pipeline {
    Pipeline::new().pipe(pass)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::validate;

    /// Standard two-row layout with the four-per-hand home-row map
    pub fn qwerty_config() -> Config {
        Config::new(&["q w e r t | y u i o p", "a s d f g | h j k l ;"])
            .with_hrm("a", Modifier::Control)
            .with_hrm("s", Modifier::Command)
            .with_hrm("d", Modifier::Shift)
            .with_hrm("f", Modifier::Alt)
            .with_hrm("j", Modifier::Alt)
            .with_hrm("k", Modifier::Shift)
            .with_hrm("l", Modifier::Command)
            .with_hrm(";", Modifier::Control)
    }

    /// Run one pass for one key of a validated config
    pub fn run_pass(pass: &dyn Pass, config: &Config, key: &str) -> Vec<Rule> {
        let validated = validate::check(config).unwrap();
        let triggers: IndexSet<Key> = config.layers.values().map(|l| l.trigger.clone()).collect();
        let key = Key::from(key);
        let ctx = PassContext {
            key: &key,
            config,
            layout: &validated.layout,
            triggers: &triggers,
        };
        pass.apply(&ctx)
    }
}
