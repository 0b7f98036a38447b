// Shared bookkeeping for composite commands.

use std::collections::BTreeSet;

use lockstep_types::{ConfigError, Resource};

use crate::command::Command;

pub(crate) type Children = Vec<Box<dyn Command>>;

pub(crate) fn union_of(children: &[Box<dyn Command>]) -> BTreeSet<Resource> {
    children
        .iter()
        .flat_map(|child| child.requirements().iter().cloned())
        .collect()
}

/// Union of the children's requirements, rejecting any resource claimed by
/// two children.
pub(crate) fn disjoint_union(
    group: &str,
    children: &[Box<dyn Command>],
) -> Result<BTreeSet<Resource>, ConfigError> {
    let mut union = BTreeSet::new();
    for child in children {
        extend_disjoint(group, &mut union, child.requirements())?;
    }
    Ok(union)
}

pub(crate) fn extend_disjoint(
    group: &str,
    union: &mut BTreeSet<Resource>,
    added: &BTreeSet<Resource>,
) -> Result<(), ConfigError> {
    if let Some(shared) = added.iter().find(|r| union.contains(*r)) {
        return Err(ConfigError::OverlappingRequirements {
            group: group.to_string(),
            resource: shared.name().to_string(),
        });
    }
    union.extend(added.iter().cloned());
    Ok(())
}

/// A group yields to a conflicting schedule only when every child would.
pub(crate) fn all_interruptible(children: &[Box<dyn Command>]) -> bool {
    children.iter().all(|child| child.is_interruptible())
}

pub(crate) fn all_run_when_disabled(children: &[Box<dyn Command>]) -> bool {
    children.iter().all(|child| child.runs_when_disabled())
}
