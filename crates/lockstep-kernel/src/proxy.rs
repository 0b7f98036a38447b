//! [`Proxy`] – separates a command's identity from its execution.
//!
//! A proxy reports no requirements of its own.  When it starts it schedules
//! its target handle on the scheduler, where the target claims its own
//! requirements and is executed by the tick loop; the proxy finishes once
//! the target is no longer scheduled.  Interrupting the proxy cancels the
//! target.  Several proxies may share one target handle, so the same command
//! can be referenced from several groups while still running as a single
//! identity.

use lockstep_types::CommandResult;
use tracing::debug;

use crate::command::Command;
use crate::handle::CommandHandle;
use crate::scheduler::{ScheduleOutcome, Scheduler};

pub struct Proxy {
    target: CommandHandle,
    scheduler: Scheduler,
    name: String,
}

impl Proxy {
    pub fn new(target: CommandHandle, scheduler: Scheduler) -> Self {
        let name = target.name();
        Self {
            target,
            scheduler,
            name,
        }
    }

    pub fn target(&self) -> &CommandHandle {
        &self.target
    }
}

impl Command for Proxy {
    fn initialize(&mut self) -> CommandResult<()> {
        if let ScheduleOutcome::Rejected { blocked_by } = self.scheduler.schedule(&self.target)? {
            debug!(command = %self.name, %blocked_by, "proxied command was not started");
        }
        Ok(())
    }

    fn is_finished(&self) -> bool {
        !self.scheduler.is_scheduled(&self.target)
    }

    fn end(&mut self) {}

    fn interrupt(&mut self) {
        self.scheduler.cancel(&self.target);
    }

    fn was_successful(&self) -> bool {
        self.target
            .inspect(|target| target.was_successful())
            .unwrap_or(true)
    }

    fn is_interruptible(&self) -> bool {
        self.target
            .inspect(|target| target.is_interruptible())
            .unwrap_or(true)
    }

    fn runs_when_disabled(&self) -> bool {
        self.target
            .inspect(|target| target.runs_when_disabled())
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
