// Homerow State Namespace
// Global uniqueness check for engine-side variable names

use std::collections::HashMap;

use super::StateVar;

/// Two distinct state variables that map to the same engine-side name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("state variable name '{name}' is produced by both {first:?} and {second:?}")]
pub struct NameCollision {
    pub name: String,
    pub first: StateVar,
    pub second: StateVar,
}

/// Check that no two distinct variables share a name.
///
/// Returns the number of distinct names seen.
pub fn check_injective<'a, I>(vars: I) -> Result<usize, NameCollision>
where
    I: IntoIterator<Item = &'a StateVar>,
{
    check_names(vars.into_iter().map(|var| (var.name(), var)))
}

fn check_names<'a, I>(named: I) -> Result<usize, NameCollision>
where
    I: IntoIterator<Item = (String, &'a StateVar)>,
{
    let mut seen: HashMap<String, &StateVar> = HashMap::new();

    for (name, var) in named {
        match seen.get(&name) {
            Some(&existing) if existing != var => {
                return Err(NameCollision {
                    name,
                    first: existing.clone(),
                    second: var.clone(),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(name, var);
            }
        }
    }

    Ok(seen.len())
}
