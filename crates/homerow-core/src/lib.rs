// Homerow Core Library
// Compiles home-row modifier and layer configurations into ordered remapping rules

pub mod combinations;
pub mod compile;
pub mod config;
pub mod key;
pub mod layout;
pub mod modifier;
pub mod rule;
pub mod state;
pub mod streak;

pub use combinations::all_combinations;
pub use compile::{compile, CompileError, CompiledKeymap, Compiler, Pass, PassContext, Pipeline};
pub use config::{
    parse_binding_string, BindingParseError, Config, ConfigError, Diagnostic, LayerDefinition,
    OutputBinding, Timing,
};
pub use key::{Hand, Key, PhysicalKey};
pub use layout::{KeyboardLayout, LayoutError};
pub use modifier::{Modifier, ModifierError, ModifierSet};
pub use rule::{
    Action, Condition, Expression, KeyMatch, KeyOutput, ModifierMatch, Rule, RuleKind, RuleSet,
    Stage, Value,
};
pub use state::{NameCollision, StateVar};
pub use streak::streak_updates;
