//! Closure-backed leaf commands.
//!
//! | Command               | Finishes                         |
//! |-----------------------|----------------------------------|
//! | [`NullCommand`]       | immediately, does nothing        |
//! | [`InstantCommand`]    | immediately, after one action    |
//! | [`RunCommand`]        | never (until cancelled)          |
//! | [`FunctionalCommand`] | when its `finished_when` says so |
//! | [`PrintCommand`]      | immediately, after logging       |
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use lockstep_kernel::{Command, RunCommand};
//! use lockstep_types::Resource;
//!
//! let shooter = Resource::new("shooter");
//! let spins = Rc::new(Cell::new(0));
//! let counter = spins.clone();
//!
//! let mut spin = RunCommand::new("spin", move || counter.set(counter.get() + 1))
//!     .requiring(shooter.clone());
//!
//! spin.initialize().unwrap();
//! spin.execute().unwrap();
//! assert_eq!(spins.get(), 1);
//! assert!(!spin.is_finished());
//! assert!(spin.has_requirement(&shooter));
//! ```

use std::collections::BTreeSet;

use lockstep_types::{CommandResult, Resource};
use tracing::info;

use crate::command::Command;

type Action = Box<dyn FnMut()>;
type FallibleAction = Box<dyn FnMut() -> CommandResult<()>>;

// ─────────────────────────────────────────────────────────────────────────────
// NullCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Does nothing and finishes on its first tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCommand;

impl Command for NullCommand {
    fn runs_when_disabled(&self) -> bool {
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// InstantCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `action` once when scheduled, then finishes.
pub struct InstantCommand {
    name: String,
    action: Action,
    requirements: BTreeSet<Resource>,
}

impl InstantCommand {
    pub fn new(name: impl Into<String>, action: impl FnMut() + 'static) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            requirements: BTreeSet::new(),
        }
    }

    pub fn requiring(mut self, resource: Resource) -> Self {
        self.requirements.insert(resource);
        self
    }
}

impl Command for InstantCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        (self.action)();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RunCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Runs `action` on every tick until cancelled or interrupted.
pub struct RunCommand {
    name: String,
    action: Action,
    requirements: BTreeSet<Resource>,
}

impl RunCommand {
    pub fn new(name: impl Into<String>, action: impl FnMut() + 'static) -> Self {
        Self {
            name: name.into(),
            action: Box::new(action),
            requirements: BTreeSet::new(),
        }
    }

    pub fn requiring(mut self, resource: Resource) -> Self {
        self.requirements.insert(resource);
        self
    }
}

impl Command for RunCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn execute(&mut self) -> CommandResult<()> {
        (self.action)();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FunctionalCommand
// ─────────────────────────────────────────────────────────────────────────────

/// A command assembled from one closure per hook.
///
/// Unset hooks fall back to the [`Command`] defaults; in particular a command
/// without [`finished_when`][FunctionalCommand::finished_when] finishes after
/// its first `execute`, and one without
/// [`on_interrupt`][FunctionalCommand::on_interrupt] runs `on_end` when
/// interrupted.
pub struct FunctionalCommand {
    name: String,
    requirements: BTreeSet<Resource>,
    on_initialize: Option<FallibleAction>,
    on_execute: Option<FallibleAction>,
    on_end: Option<Action>,
    on_interrupt: Option<Action>,
    finished_when: Option<Box<dyn Fn() -> bool>>,
}

impl FunctionalCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requirements: BTreeSet::new(),
            on_initialize: None,
            on_execute: None,
            on_end: None,
            on_interrupt: None,
            finished_when: None,
        }
    }

    pub fn requiring(mut self, resource: Resource) -> Self {
        self.requirements.insert(resource);
        self
    }

    pub fn on_initialize(mut self, f: impl FnMut() -> CommandResult<()> + 'static) -> Self {
        self.on_initialize = Some(Box::new(f));
        self
    }

    pub fn on_execute(mut self, f: impl FnMut() -> CommandResult<()> + 'static) -> Self {
        self.on_execute = Some(Box::new(f));
        self
    }

    pub fn on_end(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_end = Some(Box::new(f));
        self
    }

    pub fn on_interrupt(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_interrupt = Some(Box::new(f));
        self
    }

    pub fn finished_when(mut self, f: impl Fn() -> bool + 'static) -> Self {
        self.finished_when = Some(Box::new(f));
        self
    }
}

impl Command for FunctionalCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn initialize(&mut self) -> CommandResult<()> {
        match self.on_initialize.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }

    fn execute(&mut self) -> CommandResult<()> {
        match self.on_execute.as_mut() {
            Some(f) => f(),
            None => Ok(()),
        }
    }

    fn is_finished(&self) -> bool {
        self.finished_when.as_ref().is_none_or(|f| f())
    }

    fn end(&mut self) {
        if let Some(f) = self.on_end.as_mut() {
            f();
        }
    }

    fn interrupt(&mut self) {
        match self.on_interrupt.as_mut() {
            Some(f) => f(),
            None => self.end(),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PrintCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Logs `message` at `info` level when scheduled.  Runs while disabled.
pub struct PrintCommand {
    message: String,
}

impl PrintCommand {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Command for PrintCommand {
    fn initialize(&mut self) -> CommandResult<()> {
        info!(target: "lockstep::print", "{}", self.message);
        Ok(())
    }

    fn runs_when_disabled(&self) -> bool {
        true
    }
}
