// Homerow Default Pass
// Lowest-priority fallback: the key types itself

use super::{Pass, PassContext};
use crate::rule::{Action, Rule, RuleKind};

/// Emits the key unchanged. Trigger keys get nothing; their tap
/// behaviour lives in the trigger rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPass;

impl Pass for DefaultPass {
    fn name(&self) -> &'static str {
        "default"
    }

    fn apply(&self, ctx: &PassContext<'_>) -> Vec<Rule> {
        if ctx.is_trigger() {
            return Vec::new();
        }

        vec![Rule::new(RuleKind::Passthrough, ctx.bare())
            .then_all(ctx.streak())
            .then(Action::emit(ctx.key))]
    }
}
