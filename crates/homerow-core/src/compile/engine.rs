// Homerow Compile Engine
// Runs the pass pipeline over every key and assembles the compiled keymap
//
// Priority across passes is encoded purely as concatenation order:
// layer rules pre-empt home-row rules, which pre-empt the passthrough.

use std::fmt;

use indexmap::{IndexMap, IndexSet};

use super::{pipe, DefaultPass, HrmPass, LayerPass, PassContext, Pipeline};
use crate::config::parser::config_debug_enabled;
use crate::config::{validate, Config, ConfigError, Diagnostic};
use crate::rule::{RuleKind, RuleSet};
use crate::state::{check_injective, NameCollision};
use crate::Key;

/// Errors that stop a compile
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    NameCollision(#[from] NameCollision),
}

/// The compiled output: one ordered rule set per key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledKeymap {
    rule_sets: Vec<RuleSet>,
    diagnostics: Vec<Diagnostic>,
}

impl CompiledKeymap {
    /// Rule sets in compile order: layout keys, then off-layout triggers
    pub fn rule_sets(&self) -> &[RuleSet] {
        &self.rule_sets
    }

    pub fn rules_for(&self, key: &str) -> Option<&RuleSet> {
        self.rule_sets.iter().find(|set| set.key() == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.rule_sets.iter().map(RuleSet::key)
    }

    pub fn key_count(&self) -> usize {
        self.rule_sets.len()
    }

    /// Total rules across every key
    pub fn rule_count(&self) -> usize {
        self.rule_sets.iter().map(RuleSet::len).sum()
    }

    /// Rule totals per kind, in kind order; kinds with no rules are omitted
    pub fn kind_counts(&self) -> IndexMap<RuleKind, usize> {
        use strum::IntoEnumIterator;

        RuleKind::iter()
            .map(|kind| {
                let count: usize = self.rule_sets.iter().map(|set| set.count(kind)).sum();
                (kind, count)
            })
            .filter(|&(_, count)| count > 0)
            .collect()
    }

    /// Non-fatal findings from validation
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RuleSet> {
        self.rule_sets.iter()
    }
}

impl<'a> IntoIterator for &'a CompiledKeymap {
    type Item = &'a RuleSet;
    type IntoIter = std::slice::Iter<'a, RuleSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.rule_sets.iter()
    }
}

impl fmt::Display for CompiledKeymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, set) in self.rule_sets.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", set)?;
        }
        Ok(())
    }
}

/// Compiles a [`Config`] into per-key rule sets
#[derive(Debug)]
pub struct Compiler {
    pipeline: Pipeline,
}

impl Default for Compiler {
    fn default() -> Self {
        Self {
            pipeline: pipe(LayerPass).pipe(HrmPass).pipe(DefaultPass),
        }
    }
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom pass pipeline
    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn compile(&self, config: &Config) -> Result<CompiledKeymap, CompileError> {
        let validated = validate::check(config)?;
        for diagnostic in &validated.diagnostics {
            log::log!(diagnostic.level(), "{}", diagnostic);
        }

        let triggers: IndexSet<Key> = config
            .layers
            .values()
            .map(|layer| layer.trigger.clone())
            .collect();

        let layout = &validated.layout;
        let keys: Vec<&Key> = layout
            .all()
            .iter()
            .chain(triggers.iter().filter(|t| !layout.contains(t.name())))
            .collect();

        let mut rule_sets = Vec::with_capacity(keys.len());
        for key in keys {
            let ctx = PassContext {
                key,
                config,
                layout,
                triggers: &triggers,
            };
            let set = RuleSet::new(key.clone(), self.pipeline.run(&ctx));
            log::debug!("Compiled '{}': {} rules", key, set.len());
            if config_debug_enabled() {
                for rule in &set {
                    log::trace!("  {}", rule);
                }
            }
            rule_sets.push(set);
        }

        let names = check_injective(
            rule_sets
                .iter()
                .flat_map(|set| set.iter())
                .flat_map(|rule| rule.state_vars()),
        )?;

        let keymap = CompiledKeymap {
            rule_sets,
            diagnostics: validated.diagnostics,
        };
        log::debug!(
            "Compiled {} keys into {} rules using {} state variables",
            keymap.key_count(),
            keymap.rule_count(),
            names
        );
        Ok(keymap)
    }
}

/// Compile with the default pipeline
pub fn compile(config: &Config) -> Result<CompiledKeymap, CompileError> {
    Compiler::default().compile(config)
}
