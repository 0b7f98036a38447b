//! [`Scheduler`] – resource arbitration and the per-tick lifecycle driver.
//!
//! The scheduler holds three pieces of state:
//!
//! | Registry    | Contents                                              |
//! |-------------|-------------------------------------------------------|
//! | `scheduled` | running commands, in the order they were scheduled    |
//! | `owners`    | each [`Resource`] → the one command currently using it |
//! | `defaults`  | each [`Resource`] → the command to run when it is idle |
//!
//! At most one scheduled command requires any given resource.  Scheduling a
//! command that conflicts with running ones interrupts them when they are
//! all interruptible and is rejected, with nothing claimed, when any is not.
//! Ownership is re-read after those interrupts, so a resource claimed by an
//! `interrupt` hook also rejects the newcomer.
//!
//! # Tick
//!
//! 1. Snapshot `scheduled`.
//! 2. For each snapshot entry still scheduled, in order: skip it while
//!    disabled unless it runs when disabled; otherwise `execute`, then
//!    `is_finished`; a finished command is removed and `end`ed.  A command
//!    that faults is removed, its resources are freed and it is
//!    `interrupt`ed; the fault is reported in the [`TickReport`].
//! 3. Schedule the default command of every resource left without an owner.
//!
//! Every operation may be called from inside a command hook.  The registry
//! is never borrowed while a hook runs.  When a command has to be
//! interrupted while one of its own hooks is on the stack, it is unregistered
//! at once and its `interrupt` runs as soon as that hook returns.
//!
//! # Example
//!
//! ```
//! use lockstep_kernel::{CommandExt, RunCommand, ScheduleOutcome, Scheduler};
//! use lockstep_types::{Resource, RobotMode};
//!
//! let arm = Resource::new("arm");
//! let scheduler = Scheduler::new();
//!
//! let hold = RunCommand::new("hold", || {}).requiring(arm.clone()).into_handle();
//! let raise = RunCommand::new("raise", || {})
//!     .requiring(arm.clone())
//!     .override_interrupt(false)
//!     .into_handle();
//!
//! scheduler.schedule(&hold).unwrap();
//! scheduler.schedule(&raise).unwrap();
//! assert!(!scheduler.is_scheduled(&hold));
//!
//! // `raise` cannot be displaced implicitly...
//! let outcome = scheduler.schedule(&hold).unwrap();
//! assert!(matches!(outcome, ScheduleOutcome::Rejected { .. }));
//!
//! // ...but can always be cancelled.
//! assert!(scheduler.cancel(&raise));
//! scheduler.tick(RobotMode::Teleop);
//! ```

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use lockstep_types::{
    CommandError, CommandResult, ConfigError, FaultReport, Resource, RobotMode,
};
use tracing::{debug, debug_span, warn};

use crate::handle::{CommandHandle, CommandId};

// ─────────────────────────────────────────────────────────────────────────────
// Public types
// ─────────────────────────────────────────────────────────────────────────────

/// Result of a [`Scheduler::schedule`] call that did not fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// The command was registered and initialized.
    Started,
    /// The command was already scheduled; nothing changed.
    AlreadyScheduled,
    /// A non-interruptible owner holds one of the requirements, or an
    /// interrupted owner handed a requirement to another command.  The
    /// command itself claimed nothing.
    Rejected { blocked_by: String },
}

impl ScheduleOutcome {
    pub fn took_effect(&self) -> bool {
        matches!(self, ScheduleOutcome::Started)
    }
}

/// What happened during one [`Scheduler::tick`].
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Commands whose `execute` ran.
    pub executed: usize,
    /// Commands skipped because the robot is disabled.
    pub skipped: usize,
    /// Names of commands that finished normally.
    pub finished: Vec<String>,
    /// Names of default commands started at the end of the tick.
    pub defaults_started: Vec<String>,
    /// Uncaught faults; the faulting commands have been released.
    pub faults: Vec<FaultReport>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

struct Entry {
    handle: CommandHandle,
    requirements: BTreeSet<Resource>,
}

#[derive(Default)]
struct Registry {
    scheduled: Vec<Entry>,
    owners: HashMap<Resource, CommandId>,
    defaults: Vec<(Resource, CommandHandle)>,
    /// Interrupts owed to commands whose own hook was running when they were
    /// unregistered.
    pending_interrupts: Vec<CommandHandle>,
}

impl Registry {
    fn position(&self, id: CommandId) -> Option<usize> {
        self.scheduled.iter().position(|entry| entry.handle.id() == id)
    }

    fn owner(&self, resource: &Resource) -> Option<&Entry> {
        let id = *self.owners.get(resource)?;
        self.scheduled.iter().find(|entry| entry.handle.id() == id)
    }

    fn insert(&mut self, handle: CommandHandle, requirements: BTreeSet<Resource>) {
        for resource in &requirements {
            self.owners.insert(resource.clone(), handle.id());
        }
        self.scheduled.push(Entry {
            handle,
            requirements,
        });
    }

    /// Unregister `id` and release its resources.  Returns `false` when it was
    /// not scheduled.
    fn remove(&mut self, id: CommandId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };
        let entry = self.scheduled.remove(index);
        for resource in &entry.requirements {
            if self.owners.get(resource) == Some(&id) {
                self.owners.remove(resource);
            }
        }
        true
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// An explicit scheduling context.  Clones share the same registry, which is
/// how commands that schedule or cancel other commands reach it.
#[derive(Clone, Default)]
pub struct Scheduler {
    registry: Rc<RefCell<Registry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `handle`, resolving requirement conflicts first.
    ///
    /// # Errors
    ///
    /// Returns the fault raised by the command's `initialize`.  The command is
    /// released and interrupted before the error is returned.  Returns
    /// [`CommandError::Reentrant`] when `handle` is running one of its own
    /// hooks while not scheduled.
    pub fn schedule(&self, handle: &CommandHandle) -> CommandResult<ScheduleOutcome> {
        if self.is_scheduled(handle) {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }
        let requirements = handle
            .inspect(|command| command.requirements().clone())
            .ok_or_else(|| CommandError::Reentrant {
                command: handle.name(),
            })?;

        let conflicts = self.owners_of(&requirements);

        // An owner whose hook is on the stack is the one asking for the
        // conflicting command, so it yields.
        if let Some(blocker) = conflicts.iter().find(|owner| {
            !owner
                .inspect(|command| command.is_interruptible())
                .unwrap_or(true)
        }) {
            let blocked_by = blocker.name();
            warn!(command = %handle.name(), %blocked_by, "schedule rejected");
            return Ok(ScheduleOutcome::Rejected { blocked_by });
        }

        for owner in &conflicts {
            debug!(command = %owner.name(), by = %handle.name(), "interrupted by conflict");
            self.unregister_and_interrupt(owner);
        }
        self.run_pending_interrupts();

        // Interrupt hooks may schedule again: either this command or a new
        // claimant for one of its resources.
        if self.is_scheduled(handle) {
            return Ok(ScheduleOutcome::AlreadyScheduled);
        }
        if let Some(claimant) = self.owners_of(&requirements).first() {
            let blocked_by = claimant.name();
            warn!(command = %handle.name(), %blocked_by, "schedule rejected; resource reclaimed during interrupt");
            return Ok(ScheduleOutcome::Rejected { blocked_by });
        }

        self.registry
            .borrow_mut()
            .insert(handle.clone(), requirements);

        let initialized = match handle.lock() {
            Some(mut command) => command.initialize(),
            None => Err(CommandError::Reentrant {
                command: handle.name(),
            }),
        };
        self.run_pending_interrupts();

        if let Err(error) = initialized {
            warn!(command = %handle.name(), %error, "initialize faulted; releasing resources");
            self.unregister_and_interrupt(handle);
            self.run_pending_interrupts();
            return Err(error);
        }
        debug!(command = %handle.name(), "scheduled");
        Ok(ScheduleOutcome::Started)
    }

    /// Stop `handle` if it is scheduled, regardless of its interruptibility.
    /// Returns whether it was scheduled.
    pub fn cancel(&self, handle: &CommandHandle) -> bool {
        let cancelled = self.unregister_and_interrupt(handle);
        if cancelled {
            debug!(command = %handle.name(), "cancelled");
            self.run_pending_interrupts();
        }
        cancelled
    }

    /// Cancel every scheduled command, in scheduling order.
    pub fn cancel_all(&self) {
        for handle in self.snapshot() {
            self.cancel(&handle);
        }
    }

    pub fn is_scheduled(&self, handle: &CommandHandle) -> bool {
        self.registry.borrow().position(handle.id()).is_some()
    }

    /// The command currently owning `resource`.
    pub fn requiring(&self, resource: &Resource) -> Option<CommandHandle> {
        self.registry
            .borrow()
            .owner(resource)
            .map(|entry| entry.handle.clone())
    }

    /// Register `handle` to run whenever `resource` has no owner, replacing
    /// any previous default for it.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDefaultCommand`] unless the command requires
    /// exactly `{resource}`.
    pub fn set_default_command(
        &self,
        resource: &Resource,
        handle: CommandHandle,
    ) -> Result<(), ConfigError> {
        let invalid = |details: &str| ConfigError::InvalidDefaultCommand {
            resource: resource.name().to_string(),
            details: details.to_string(),
        };
        let (requirements, interruptible) = handle
            .inspect(|command| (command.requirements().clone(), command.is_interruptible()))
            .ok_or_else(|| invalid("command is running a lifecycle hook"))?;

        if requirements.len() != 1 || !requirements.contains(resource) {
            return Err(invalid("default commands must require exactly their resource"));
        }
        if !interruptible {
            warn!(resource = %resource, command = %handle.name(), "non-interruptible default command");
        }

        let mut registry = self.registry.borrow_mut();
        match registry.defaults.iter().position(|(r, _)| r == resource) {
            Some(index) => registry.defaults[index].1 = handle,
            None => registry.defaults.push((resource.clone(), handle)),
        }
        Ok(())
    }

    /// Unregister the default command of `resource`.  A running default is
    /// left running.
    pub fn remove_default_command(&self, resource: &Resource) -> Option<CommandHandle> {
        let mut registry = self.registry.borrow_mut();
        let index = registry.defaults.iter().position(|(r, _)| r == resource)?;
        Some(registry.defaults.remove(index).1)
    }

    pub fn default_command(&self, resource: &Resource) -> Option<CommandHandle> {
        self.registry
            .borrow()
            .defaults
            .iter()
            .find(|(r, _)| r == resource)
            .map(|(_, handle)| handle.clone())
    }

    /// Names of the scheduled commands, in scheduling order.
    pub fn scheduled_names(&self) -> Vec<String> {
        self.snapshot().iter().map(CommandHandle::name).collect()
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().scheduled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.borrow().scheduled.is_empty()
    }

    /// Run one scheduling pass.  `mode` is the outer driver's current mode.
    pub fn tick(&self, mode: RobotMode) -> TickReport {
        let span = debug_span!("tick", %mode);
        let _entered = span.enter();
        let mut report = TickReport::default();

        for handle in self.snapshot() {
            // Interrupted or cancelled earlier in this tick.
            if !self.is_scheduled(&handle) {
                continue;
            }
            let step = match handle.lock() {
                None => continue,
                Some(mut command) => {
                    if !mode.is_enabled() && !command.runs_when_disabled() {
                        Step::Skipped
                    } else {
                        match command.execute() {
                            Err(error) => Step::Faulted(error),
                            Ok(()) if self.is_scheduled(&handle) && command.is_finished() => {
                                Step::Finished
                            }
                            Ok(()) => Step::Running,
                        }
                    }
                }
            };
            self.run_pending_interrupts();

            match step {
                Step::Skipped => report.skipped += 1,
                Step::Running => report.executed += 1,
                Step::Finished => {
                    report.executed += 1;
                    if self.registry.borrow_mut().remove(handle.id()) {
                        if let Some(mut command) = handle.lock() {
                            command.end();
                        }
                        debug!(command = %handle.name(), "finished");
                        report.finished.push(handle.name());
                        self.run_pending_interrupts();
                    }
                }
                Step::Faulted(error) => {
                    report.executed += 1;
                    let name = handle.name();
                    warn!(command = %name, %error, "execute faulted; releasing resources");
                    self.unregister_and_interrupt(&handle);
                    self.run_pending_interrupts();
                    report.faults.push(FaultReport::new(name, error));
                }
            }
        }

        for handle in self.idle_defaults() {
            match self.schedule(&handle) {
                Ok(ScheduleOutcome::Started) => {
                    debug!(command = %handle.name(), "default command started");
                    report.defaults_started.push(handle.name());
                }
                Ok(_) => {}
                Err(error) => report.faults.push(FaultReport::new(handle.name(), error)),
            }
        }
        report
    }

    // ── internals ────────────────────────────────────────────────────────────

    fn snapshot(&self) -> Vec<CommandHandle> {
        self.registry
            .borrow()
            .scheduled
            .iter()
            .map(|entry| entry.handle.clone())
            .collect()
    }

    /// Defaults whose resource is free and which are not already running, in
    /// registration order.
    fn idle_defaults(&self) -> Vec<CommandHandle> {
        let registry = self.registry.borrow();
        registry
            .defaults
            .iter()
            .filter(|(resource, handle)| {
                !registry.owners.contains_key(resource) && registry.position(handle.id()).is_none()
            })
            .map(|(_, handle)| handle.clone())
            .collect()
    }

    /// Distinct current owners of `requirements`, in requirement order.
    fn owners_of(&self, requirements: &BTreeSet<Resource>) -> Vec<CommandHandle> {
        let registry = self.registry.borrow();
        let mut found: Vec<CommandHandle> = Vec::new();
        for resource in requirements {
            if let Some(owner) = registry.owner(resource) {
                if !found.contains(&owner.handle) {
                    found.push(owner.handle.clone());
                }
            }
        }
        found
    }

        fn unregister_and_interrupt(&self, handle: &CommandHandle) -> bool {
        if !self.registry.borrow_mut().remove(handle.id()) {
            return false;
        }
        match handle.lock() {
            Some(mut command) => command.interrupt(),
            None => self
                .registry
                .borrow_mut()
                .pending_interrupts
                .push(handle.clone()),
        }
        true
    }

    fn run_pending_interrupts(&self) {
        loop {
            let ready = {
                let mut registry = self.registry.borrow_mut();
                let Some(index) = registry
                    .pending_interrupts
                    .iter()
                    .position(|handle| !handle.is_busy())
                else {
                    return;
                };
                registry.pending_interrupts.remove(index)
            };
            if let Some(mut command) = ready.lock() {
                command.interrupt();
            }
        }
    }

    #[cfg(test)]
    fn assert_exclusive(&self) {
        let registry = self.registry.borrow();
        let mut seen = BTreeSet::new();
        for entry in &registry.scheduled {
            for resource in &entry.requirements {
                assert!(seen.insert(resource.clone()), "{resource} owned twice");
                assert_eq!(registry.owners.get(resource), Some(&entry.handle.id()));
            }
        }
        assert_eq!(seen.len(), registry.owners.len());
    }
}

enum Step {
    Skipped,
    Running,
    Finished,
    Faulted(CommandError),
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("scheduled", &self.scheduled_names())
            .finish()
    }
}
