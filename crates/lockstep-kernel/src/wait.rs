//! Timing primitives with no requirements.
//!
//! These are the second contestant in the races behind
//! [`with_timeout`][crate::CommandExt::with_timeout] and
//! [`until`][crate::CommandExt::until].

use std::rc::Rc;
use std::time::Duration;

use lockstep_types::CommandResult;

use crate::clock::{Clock, SystemClock};
use crate::command::{Command, Condition};

/// Finishes once `duration` has elapsed since it was initialized.
pub struct Wait {
    duration: Duration,
    clock: Rc<dyn Clock>,
    started_at: Duration,
}

impl Wait {
    pub fn new(duration: Duration) -> Self {
        Self::with_clock(duration, Rc::new(SystemClock::default()))
    }

    pub fn with_clock(duration: Duration, clock: Rc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            duration,
            clock,
            started_at,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.started_at)
    }
}

impl Command for Wait {
    fn initialize(&mut self) -> CommandResult<()> {
        self.started_at = self.clock.now();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.elapsed() >= self.duration
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}

/// Finishes on the first tick its condition evaluates true.
pub struct WaitUntil {
    condition: Condition,
    satisfied: bool,
}

impl WaitUntil {
    pub fn new(condition: impl FnMut() -> bool + 'static) -> Self {
        Self {
            condition: Box::new(condition),
            satisfied: false,
        }
    }
}

impl Command for WaitUntil {
    fn initialize(&mut self) -> CommandResult<()> {
        self.satisfied = false;
        Ok(())
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.satisfied = (self.condition)();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.satisfied
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}
