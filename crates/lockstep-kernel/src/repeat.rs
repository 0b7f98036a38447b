//! [`Repeat`] – restarts its child every time it finishes.
//!
//! The child is ended and re-initialized in the same tick it finishes, so a
//! repeat never reports finished on its own.  Bound it with
//! [`until`][crate::CommandExt::until] or cancel it.

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, Resource};

use crate::command::Command;

pub struct Repeat {
    child: Box<dyn Command>,
    cycles: u64,
}

impl Repeat {
    pub fn new(child: impl Command + 'static) -> Self {
        Self {
            child: Box::new(child),
            cycles: 0,
        }
    }

    /// Number of child runs completed in the current episode.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Command for Repeat {
    fn requirements(&self) -> &BTreeSet<Resource> {
        self.child.requirements()
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.cycles = 0;
        self.child.initialize()
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.child.execute()?;
        if self.child.is_finished() {
            self.child.end();
            self.cycles += 1;
            self.child.initialize()?;
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self) {
        self.child.end();
    }

    fn interrupt(&mut self) {
        self.child.interrupt();
    }

    fn was_successful(&self) -> bool {
        self.child.was_successful()
    }

    fn is_interruptible(&self) -> bool {
        self.child.is_interruptible()
    }

    fn runs_when_disabled(&self) -> bool {
        self.child.runs_when_disabled()
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
    fn restarts_in_the_same_tick_and_never_finishes() {
        let journal = Journal::default();
        let mut repeat = Probe::new("c", &journal).finishes_after(1).repeatedly();

        repeat.initialize().unwrap();
        for _ in 0..5 {
            repeat.execute().unwrap();
            assert!(!repeat.is_finished());
        }
        assert_eq!(repeat.cycles(), 5);
        assert_eq!(journal.count("c.initialize"), 6);
        assert_eq!(journal.count("c.end"), 5);
        assert_eq!(
            &journal.entries()[..4],
            ["c.initialize", "c.execute", "c.end", "c.initialize"]
        );
    }

    #[test]
    fn interrupt_reaches_the_child() {
        let journal = Journal::default();
        let mut repeat = Probe::new("c", &journal).repeatedly();
        repeat.initialize().unwrap();
        repeat.execute().unwrap();
        repeat.interrupt();
        assert_eq!(journal.count("c.interrupt"), 1);
    }

    #[test]
    fn repeat_until_finishes_on_first_true_tick_after_a_full_cycle() {
        let journal = Journal::default();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let mut bounded = Probe::new("c", &journal)
            .finishes_after(1)
            .repeat_until(move || flag.get());

        bounded.initialize().unwrap();
        bounded.execute().unwrap();
        bounded.execute().unwrap();
        assert!(!bounded.is_finished());

        done.set(true);
        bounded.execute().unwrap();
        assert!(bounded.is_finished());
        assert_eq!(journal.count("c.end"), 3);
        // The restarted child is cut off by the race.
        assert_eq!(journal.count("c.interrupt"), 1);
    }

    #[test]
    fn repeat_until_true_from_the_start_still_runs_one_cycle() {
        let journal = Journal::default();
        let mut bounded = Probe::new("c", &journal)
            .finishes_after(1)
            .repeat_until(|| true);

        bounded.initialize().unwrap();
        bounded.execute().unwrap();
        assert!(bounded.is_finished());
        assert_eq!(journal.count("c.end"), 1);
    }

    #[test]
    fn inherits_child_metadata() {
        let journal = Journal::default();
        let arm = Resource::new("arm");
        let repeat = Probe::new("c", &journal)
            .requiring(arm.clone())
            .non_interruptible()
            .runs_disabled()
            .repeatedly();
        assert!(repeat.has_requirement(&arm));
        assert!(!repeat.is_interruptible());
        assert!(repeat.runs_when_disabled());
    }
}
