//! Test-only helpers: a lifecycle-recording command.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use lockstep_types::{CommandError, CommandResult, Resource};

use crate::command::Command;

/// Shared, ordered log of `"<label>.<hook>"` entries.
#[derive(Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub(crate) fn record(&self, entry: String) {
        self.0.borrow_mut().push(entry);
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| *e == entry).count()
    }

    pub(crate) fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// A command that records every hook call into a [`Journal`].
///
/// `interrupt` is recorded on its own and does not fall through to `end`, so
/// tests can tell the two apart.
pub(crate) struct Probe {
    label: String,
    journal: Journal,
    requirements: BTreeSet<Resource>,
    finish_after: Option<u32>,
    executions: u32,
    interruptible: bool,
    runs_when_disabled: bool,
    fail_on_execute: Option<u32>,
    fail_on_initialize: bool,
}

impl Probe {
    pub(crate) fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
            requirements: BTreeSet::new(),
            finish_after: None,
            executions: 0,
            interruptible: true,
            runs_when_disabled: false,
            fail_on_execute: None,
            fail_on_initialize: false,
        }
    }

    pub(crate) fn requiring(mut self, resource: Resource) -> Self {
        self.requirements.insert(resource);
        self
    }

    /// Finish after the `n`th execute of each episode.
    pub(crate) fn finishes_after(mut self, n: u32) -> Self {
        self.finish_after = Some(n);
        self
    }

    pub(crate) fn non_interruptible(mut self) -> Self {
        self.interruptible = false;
        self
    }

    pub(crate) fn runs_disabled(mut self) -> Self {
        self.runs_when_disabled = true;
        self
    }

    /// Fault on the `n`th execute of each episode.
    pub(crate) fn fails_on_execute(mut self, n: u32) -> Self {
        self.fail_on_execute = Some(n);
        self
    }

    pub(crate) fn fails_on_initialize(mut self) -> Self {
        self.fail_on_initialize = true;
        self
    }

    fn record(&self, hook: &str) {
        self.journal.record(format!("{}.{}", self.label, hook));
    }
}

impl Command for Probe {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        self.executions = 0;
        self.record("initialize");
        if self.fail_on_initialize {
            return Err(CommandError::fault(&self.label, "initialize failed"));
        }
        Ok(())
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.executions += 1;
        self.record("execute");
        if self.fail_on_execute == Some(self.executions) {
            return Err(CommandError::fault(&self.label, "execute failed"));
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        self.finish_after.is_some_and(|n| self.executions >= n)
    }

    fn end(&mut self) {
        self.record("end");
    }

    fn interrupt(&mut self) {
        self.record("interrupt");
    }

    fn is_interruptible(&self) -> bool {
        self.interruptible
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }

    fn name(&self) -> &str {
        &self.label
    }
}
