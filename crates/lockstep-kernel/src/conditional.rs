//! [`Conditional`] – picks one of two commands when it starts.
//!
//! The condition is evaluated exactly once per episode, in `initialize`; the
//! selected branch then receives the whole lifecycle.  Requirements are the
//! union of both branches because either may end up running.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, Resource};

use crate::command::{Command, Condition};
use crate::group::union_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Branch {
    OnTrue,
    OnFalse,
}

pub struct Conditional {
    branches: [Box<dyn Command>; 2],
    condition: Condition,
    selected: Option<Branch>,
    requirements: BTreeSet<Resource>,
}

impl Conditional {
    pub fn new(
        on_true: impl Command + 'static,
        on_false: impl Command + 'static,
        condition: impl FnMut() -> bool + 'static,
    ) -> Self {
        let branches: [Box<dyn Command>; 2] = [Box::new(on_true), Box::new(on_false)];
        let requirements = union_of(&branches);
        Self {
            branches,
            condition: Box::new(condition),
            selected: None,
            requirements,
        }
    }

    /// `Some(true)` when the on-true branch was selected this episode.
    pub fn selected(&self) -> Option<bool> {
        self.selected.map(|branch| branch == Branch::OnTrue)
    }

    fn index(branch: Branch) -> usize {
        match branch {
            Branch::OnTrue => 0,
            Branch::OnFalse => 1,
        }
    }

    fn active(&self) -> Option<&dyn Command> {
        let branch = self.selected?;
        Some(self.branches[Self::index(branch)].as_ref())
    }

    fn active_mut(&mut self) -> Option<&mut Box<dyn Command>> {
        let branch = self.selected?;
        Some(&mut self.branches[Self::index(branch)])
    }
}

impl Command for Conditional {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        let branch = if (self.condition)() {
            Branch::OnTrue
        } else {
            Branch::OnFalse
        };
        self.selected = Some(branch);
        self.branches[Self::index(branch)].initialize()
    }

    fn execute(&mut self) -> CommandResult<()> {
        match self.active_mut() {
            Some(active) => active.execute(),
            None => Ok(()),
        }
    }

    fn is_finished(&self) -> bool {
        self.active().is_none_or(|active| active.is_finished())
    }

    fn end(&mut self) {
        if let Some(active) = self.active_mut() {
            active.end();
        }
    }

    fn interrupt(&mut self) {
        if let Some(active) = self.active_mut() {
            active.interrupt();
        }
    }

    fn was_successful(&self) -> bool {
        self.active().is_none_or(|active| active.was_successful())
    }

    fn is_interruptible(&self) -> bool {
        match self.active() {
            Some(active) => active.is_interruptible(),
            None => self.branches.iter().all(|b| b.is_interruptible()),
        }
    }

    fn runs_when_disabled(&self) -> bool {
        match self.active() {
            Some(active) => active.runs_when_disabled(),
            None => self.branches.iter().all(|b| b.runs_when_disabled()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandExt;
    use crate::testing::{Journal, Probe};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn selects_once_and_delegates_the_whole_lifecycle() {
        let journal = Journal::default();
        let switch = Rc::new(Cell::new(true));
        let evaluations = Rc::new(Cell::new(0));
        let (flag, counter) = (switch.clone(), evaluations.clone());

        let mut cond = Conditional::new(
            Probe::new("yes", &journal).finishes_after(2),
            Probe::new("no", &journal).finishes_after(1),
            move || {
                counter.set(counter.get() + 1);
                flag.get()
            },
        );

        cond.initialize().unwrap();
        assert_eq!(cond.selected(), Some(true));

        // Flipping the input mid-run has no effect on the chosen branch.
        switch.set(false);
        cond.execute().unwrap();
        assert!(!cond.is_finished());
        cond.execute().unwrap();
        assert!(cond.is_finished());
        cond.end();

        assert_eq!(evaluations.get(), 1);
        assert_eq!(journal.count("no.initialize"), 0);
        assert_eq!(journal.count("yes.end"), 1);
    }

    #[test]
    fn requirements_cover_both_branches() {
        let journal = Journal::default();
        let (arm, wrist) = (Resource::new("arm"), Resource::new("wrist"));
        let cond = Conditional::new(
            Probe::new("a", &journal).requiring(arm.clone()),
            Probe::new("b", &journal).requiring(wrist.clone()),
            || true,
        );
        assert!(cond.has_requirement(&arm));
        assert!(cond.has_requirement(&wrist));
    }

    #[test]
    fn unless_skips_when_condition_holds() {
        let journal = Journal::default();
        let mut skipped = Probe::new("c", &journal).unless(|| true);
        skipped.initialize().unwrap();
        skipped.execute().unwrap();
        assert!(skipped.is_finished());
        assert!(journal.entries().is_empty());
    }

    #[test]
    fn only_if_runs_when_condition_holds() {
        let journal = Journal::default();
        let mut gated = Probe::new("c", &journal).finishes_after(1).only_if(|| true);
        gated.initialize().unwrap();
        gated.execute().unwrap();
        assert!(gated.is_finished());
        gated.end();
        assert_eq!(journal.entries(), vec!["c.initialize", "c.execute", "c.end"]);
    }

    #[test]
    fn interrupt_reaches_the_selected_branch_only() {
        let journal = Journal::default();
        let mut cond = Conditional::new(
            Probe::new("a", &journal),
            Probe::new("b", &journal),
            || false,
        );
        cond.initialize().unwrap();
        cond.interrupt();
        assert_eq!(journal.count("b.interrupt"), 1);
        assert_eq!(journal.count("a.interrupt"), 0);
    }
}
