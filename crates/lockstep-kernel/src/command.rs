//! The [`Command`] contract and its combinators.
//!
//! A command is a small state machine driven by the
//! [`Scheduler`][crate::scheduler::Scheduler]:
//!
//! ```text
//! initialize ─► execute ─► is_finished? ──yes──► end
//!                  ▲             │
//!                  └─────no──────┘      (interrupt replaces end on early stop)
//! ```
//!
//! Every hook has a default so leaf commands only override what they need.
//! [`CommandExt`] builds new commands out of existing ones; the operand is
//! moved into the result, so one composed command can never sit in two
//! groups at once.  Use [`CommandHandle::proxy`] when an identity has to be
//! shared.

use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use lockstep_types::{CommandResult, ConfigError, Resource};

use crate::clock::Clock;
use crate::conditional::Conditional;
use crate::handle::CommandHandle;
use crate::parallel::Parallel;
use crate::primitives::NullCommand;
use crate::race::Race;
use crate::recovery::Recovery;
use crate::repeat::Repeat;
use crate::sequential::Sequential;
use crate::target::Target;
use crate::wait::{Wait, WaitUntil};

/// Zero-argument predicate supplied by the input layer, evaluated fresh on
/// every call.
pub type Condition = Box<dyn FnMut() -> bool>;

pub(crate) static NO_REQUIREMENTS: BTreeSet<Resource> = BTreeSet::new();

/// A unit of behavior run by the scheduler.
pub trait Command {
    /// Resources this command needs exclusively while scheduled.  Must not
    /// change over the command's lifetime.
    fn requirements(&self) -> &BTreeSet<Resource> {
        &NO_REQUIREMENTS
    }

    /// Called once each time the command is scheduled, before the first
    /// [`execute`][Command::execute].
    fn initialize(&mut self) -> CommandResult<()> {
        Ok(())
    }

    /// Called once per tick while scheduled.  Must not block.
    fn execute(&mut self) -> CommandResult<()> {
        Ok(())
    }

    /// Polled after every [`execute`][Command::execute].
    fn is_finished(&self) -> bool {
        true
    }

    /// Called once after [`is_finished`][Command::is_finished] returns `true`.
    fn end(&mut self) {}

    /// Called instead of [`end`][Command::end] when the command is stopped
    /// early, either by a conflicting schedule or an explicit cancel.
    fn interrupt(&mut self) {
        self.end();
    }

    /// Post-hoc status, used for self-test style commands.
    fn was_successful(&self) -> bool {
        true
    }

    /// Whether a conflicting schedule may displace this command.  Explicit
    /// cancellation ignores this flag.
    fn is_interruptible(&self) -> bool {
        true
    }

    /// Whether the command keeps executing while the robot is disabled.
    fn runs_when_disabled(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn has_requirement(&self, resource: &Resource) -> bool {
        self.requirements().contains(resource)
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn requirements(&self) -> &BTreeSet<Resource> {
        (**self).requirements()
    }

    fn initialize(&mut self) -> CommandResult<()> {
        (**self).initialize()
    }

    fn execute(&mut self) -> CommandResult<()> {
        (**self).execute()
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn end(&mut self) {
        (**self).end()
    }

    fn interrupt(&mut self) {
        (**self).interrupt()
    }

    fn was_successful(&self) -> bool {
        (**self).was_successful()
    }

    fn is_interruptible(&self) -> bool {
        (**self).is_interruptible()
    }

    fn runs_when_disabled(&self) -> bool {
        (**self).runs_when_disabled()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Strip the module path and generic arguments from a type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Combinators available on every sized command.
pub trait CommandExt: Command + Sized + 'static {
    /// Interrupt this command if it has not finished after `timeout`.
    fn with_timeout(self, timeout: Duration) -> Race {
        Race::against(self, Wait::new(timeout))
    }

    /// Like [`with_timeout`][CommandExt::with_timeout], measured on `clock`.
    fn with_timeout_on(self, timeout: Duration, clock: Rc<dyn Clock>) -> Race {
        Race::against(self, Wait::with_clock(timeout, clock))
    }

    /// Interrupt this command once `condition` becomes true.
    fn until(self, condition: impl FnMut() -> bool + 'static) -> Race {
        Race::against(self, WaitUntil::new(condition))
    }

    /// Skip this command if `condition` is true when it is scheduled.
    fn unless(self, condition: impl FnMut() -> bool + 'static) -> Conditional {
        Conditional::new(NullCommand, self, condition)
    }

    /// Skip this command if `condition` is false when it is scheduled.
    fn only_if(self, condition: impl FnMut() -> bool + 'static) -> Conditional {
        Conditional::new(self, NullCommand, condition)
    }

    fn before_starting(self, before: impl Command + 'static) -> Sequential {
        let first: Box<dyn Command> = Box::new(before);
        Sequential::new(vec![first]).and_then(self)
    }

    fn and_then(self, next: impl Command + 'static) -> Sequential {
        let first: Box<dyn Command> = Box::new(self);
        Sequential::new(vec![first]).and_then(next)
    }

    /// Run alongside `other`, finishing when both have finished.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when the two share a resource.
    fn along_with(self, other: impl Command + 'static) -> Result<Parallel, ConfigError> {
        let first: Box<dyn Command> = Box::new(self);
        Parallel::new(vec![first])?.along_with(other)
    }

    /// Run alongside `other`, finishing when either finishes.
    ///
    /// # Errors
    ///
    /// [`ConfigError::OverlappingRequirements`] when the two share a resource.
    fn race_with(self, other: impl Command + 'static) -> Result<Race, ConfigError> {
        let first: Box<dyn Command> = Box::new(self);
        Race::new(vec![first])?.race_with(other)
    }

    fn repeatedly(self) -> Repeat {
        Repeat::new(self)
    }

    fn repeat_until(self, condition: impl FnMut() -> bool + 'static) -> Race {
        Repeat::new(self).until(condition)
    }

    /// Contain faults raised by this command instead of propagating them.
    fn catch_faults(self) -> Recovery {
        Recovery::new(self)
    }

    fn override_disable(self, runs_when_disabled: bool) -> Target {
        Target::new(self).override_disable(runs_when_disabled)
    }

    fn override_interrupt(self, interruptible: bool) -> Target {
        Target::new(self).override_interrupt(interruptible)
    }

    fn with_name(self, name: impl Into<String>) -> Target {
        Target::new(self).with_name(name)
    }

    /// Wrap this command in a [`CommandHandle`] so it can be scheduled.
    fn into_handle(self) -> CommandHandle {
        CommandHandle::new(self)
    }
}

impl<C: Command + 'static> CommandExt for C {}
