//! [`Recovery`] – contains faults raised by the decorated command.
//!
//! A fault from `initialize` or `execute` is logged, kept for inspection and
//! finishes the decorator; it never reaches the scheduler.  On that path the
//! inner command is cleaned up through `interrupt`, since it did not finish
//! normally.

use std::collections::BTreeSet;

use lockstep_types::{CommandError, CommandResult, Resource};
use tracing::warn;

use crate::command::Command;

pub struct Recovery {
    inner: Box<dyn Command>,
    fault: Option<CommandError>,
}

impl Recovery {
    pub fn new(inner: impl Command + 'static) -> Self {
        Self {
            inner: Box::new(inner),
            fault: None,
        }
    }

    /// The fault caught during the current episode, if any.
    pub fn fault(&self) -> Option<&CommandError> {
        self.fault.as_ref()
    }

    fn contain(&mut self, result: CommandResult<()>) {
        if let Err(error) = result {
            warn!(command = %self.inner.name(), %error, "fault contained");
            self.fault = Some(error);
        }
    }
}

impl Command for Recovery {
    fn requirements(&self) -> &BTreeSet<Resource> {
        self.inner.requirements()
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.fault = None;
        let result = self.inner.initialize();
        self.contain(result);
        Ok(())
    }

    fn execute(&mut self) -> CommandResult<()> {
        if self.fault.is_none() {
            let result = self.inner.execute();
            self.contain(result);
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.fault.is_some() || self.inner.is_finished()
    }

    fn end(&mut self) {
        if self.fault.is_some() {
            self.inner.interrupt();
        } else {
            self.inner.end();
        }
    }

    fn interrupt(&mut self) {
        self.inner.interrupt();
    }

    fn was_successful(&self) -> bool {
        self.fault.is_none() && self.inner.was_successful()
    }

    fn is_interruptible(&self) -> bool {
        self.inner.is_interruptible()
    }

    fn runs_when_disabled(&self) -> bool {
        self.inner.runs_when_disabled()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
