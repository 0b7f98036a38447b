//! Operator inputs for the simulation.
//!
//! [`MatchScript`] stands in for the driver station: it derives the robot
//! mode and the controller state from elapsed match time, so every run of the
//! simulator is identical.  [`Binding`] turns a boolean input into schedule
//! and cancel requests, evaluated once per loop step.

use std::rc::Rc;
use std::time::Duration;

use lockstep_kernel::{Clock, CommandHandle, Scheduler};
use lockstep_types::RobotMode;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// MatchScript
// ─────────────────────────────────────────────────────────────────────────────

/// Scripted match timeline: disabled, then autonomous, then teleop.
#[derive(Clone)]
pub struct MatchScript {
    clock: Rc<dyn Clock>,
    autonomous_at: Duration,
    teleop_at: Duration,
}

impl MatchScript {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            autonomous_at: Duration::from_millis(500),
            teleop_at: Duration::from_millis(3500),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.clock.now()
    }

    pub fn mode(&self) -> RobotMode {
        let now = self.elapsed();
        if now < self.autonomous_at {
            RobotMode::Disabled
        } else if now < self.teleop_at {
            RobotMode::Autonomous
        } else {
            RobotMode::Teleop
        }
    }

    fn teleop_seconds(&self) -> Option<f64> {
        (self.mode() == RobotMode::Teleop)
            .then(|| (self.elapsed() - self.teleop_at).as_secs_f64())
    }

    /// Left stick Y, squared with its sign kept.
    pub fn left_stick_y_squared(&self) -> f64 {
        let raw = self.teleop_seconds().map_or(0.0, |t| 0.8 * (t * 0.9).sin());
        raw * raw.abs()
    }

    /// Right stick X, squared with its sign kept.
    pub fn right_stick_x_squared(&self) -> f64 {
        let raw = self.teleop_seconds().map_or(0.0, |t| 0.5 * (t * 1.7).cos());
        raw * raw.abs()
    }

    /// Right bumper: held for two of every four teleop seconds.
    pub fn shooter_button(&self) -> bool {
        self.teleop_seconds().is_some_and(|t| (1.0..3.0).contains(&(t % 4.0)))
    }

    /// B button: tapped for the first 200 ms of every four teleop seconds.
    pub fn mark_button(&self) -> bool {
        self.teleop_seconds().is_some_and(|t| t % 4.0 < 0.2)
    }

    /// A button: held during the second half of each shooter press.
    pub fn feeder_button(&self) -> bool {
        self.teleop_seconds().is_some_and(|t| (2.0..3.0).contains(&(t % 4.0)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Binding
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingKind {
    /// Schedule on the rising edge, cancel on the falling edge.
    WhileTrue,
    /// Schedule on the rising edge only.
    OnTrue,
}

/// Edge-triggered link between an input and a command.
pub struct Binding {
    condition: Box<dyn FnMut() -> bool>,
    handle: CommandHandle,
    kind: BindingKind,
    previous: bool,
}

impl Binding {
    pub fn while_true(condition: impl FnMut() -> bool + 'static, handle: CommandHandle) -> Self {
        Self::new(condition, handle, BindingKind::WhileTrue)
    }

    pub fn on_true(condition: impl FnMut() -> bool + 'static, handle: CommandHandle) -> Self {
        Self::new(condition, handle, BindingKind::OnTrue)
    }

    fn new(
        condition: impl FnMut() -> bool + 'static,
        handle: CommandHandle,
        kind: BindingKind,
    ) -> Self {
        Self {
            condition: Box::new(condition),
            handle,
            kind,
            previous: false,
        }
    }

    /// Sample the input and act on any edge.
    pub fn poll(&mut self, scheduler: &Scheduler) {
        let current = (self.condition)();
        match (self.previous, current) {
            (false, true) => match scheduler.schedule(&self.handle) {
                Ok(outcome) => {
                    debug!(command = %self.handle.name(), ?outcome, "binding fired");
                }
                Err(error) => {
                    debug!(command = %self.handle.name(), %error, "bound command faulted on start");
                }
            },
            (true, false) if self.kind == BindingKind::WhileTrue => {
                scheduler.cancel(&self.handle);
            }
            _ => {}
        }
        self.previous = current;
    }

    /// Consume the binding into a loop poller.
    pub fn into_poller(mut self) -> impl FnMut(&Scheduler) {
        move |scheduler| self.poll(scheduler)
    }
}
