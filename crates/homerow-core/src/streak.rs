// Homerow Streak Tracker
// The rolling typing-streak window refreshed by every key that outputs

use crate::rule::{Action, Expression, Value};
use crate::state::StateVar;

/// The two variable writes that prefix every output action sequence.
///
/// The first latches whether the previous window is still open into
/// `isTypingStreak`; the second reopens the window for `window_ms`.
/// Order matters: the flag must be computed from the old expiry.
pub fn streak_updates(window_ms: u64) -> [Action; 2] {
    [
        Action::SetVar {
            var: StateVar::IsTypingStreak,
            value: Value::Expr(Expression::StreakActive),
        },
        Action::SetVar {
            var: StateVar::StreakExpiry,
            value: Value::Expr(Expression::NowPlus(window_ms)),
        },
    ]
}

/// True if `actions` starts with exactly the streak-update pair
pub fn starts_with_streak_updates(actions: &[Action]) -> bool {
    match actions {
        [Action::SetVar {
            var: StateVar::IsTypingStreak,
            value: Value::Expr(Expression::StreakActive),
        }, Action::SetVar {
            var: StateVar::StreakExpiry,
            value: Value::Expr(Expression::NowPlus(_)),
        }, rest @ ..] => !rest.iter().any(is_streak_update),
        _ => false,
    }
}

fn is_streak_update(action: &Action) -> bool {
    matches!(
        action.var(),
        Some(StateVar::IsTypingStreak) | Some(StateVar::StreakExpiry)
    ) && matches!(action, Action::SetVar { .. })
}
