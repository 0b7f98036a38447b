//! [`RobotLoop`] – the periodic driver around a [`Scheduler`].
//!
//! Each [`step`][RobotLoop::step]:
//!
//! 1. reads the current [`RobotMode`] from the mode source, logging changes;
//! 2. runs every registered input poller (button bindings and the like);
//! 3. runs one [`Scheduler::tick`];
//! 4. logs each uncaught fault once at `error` level and records the step as
//!    an overrun when it took longer than the loop period.
//!
//! [`run_until`][RobotLoop::run_until] repeats this on a fixed-rate schedule,
//! sleeping to each period deadline.  A step that overruns pushes the next
//! deadline out instead of letting missed ticks pile up.

use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use lockstep_kernel::{Clock, Scheduler, SystemClock, TickReport};
use lockstep_types::RobotMode;
use tracing::{error, info, warn};

/// Counters accumulated over the loop's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub steps: u64,
    pub overruns: u64,
    pub faults: u64,
    /// Longest single step observed.
    pub worst_step: Duration,
}

type Poller = Box<dyn FnMut(&Scheduler)>;

pub struct RobotLoop {
    scheduler: Scheduler,
    mode_source: Box<dyn FnMut() -> RobotMode>,
    pollers: Vec<Poller>,
    period: Duration,
    clock: Rc<dyn Clock>,
    mode: Option<RobotMode>,
    stats: LoopStats,
}

impl RobotLoop {
    pub fn new(
        scheduler: Scheduler,
        period: Duration,
        mode_source: impl FnMut() -> RobotMode + 'static,
    ) -> Self {
        Self {
            scheduler,
            mode_source: Box::new(mode_source),
            pollers: Vec::new(),
            period,
            clock: Rc::new(SystemClock::default()),
            mode: None,
            stats: LoopStats::default(),
        }
    }

    /// Measure step durations on `clock` instead of wall time.
    pub fn with_clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register `poller` to run before every tick, in registration order.
    pub fn add_poller(&mut self, poller: impl FnMut(&Scheduler) + 'static) {
        self.pollers.push(Box::new(poller));
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Mode observed on the most recent step.
    pub fn mode(&self) -> Option<RobotMode> {
        self.mode
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn step(&mut self) -> TickReport {
        let mode = (self.mode_source)();
        if self.mode != Some(mode) {
            match self.mode {
                Some(previous) => info!(from = %previous, to = %mode, "mode transition"),
                None => info!(%mode, "initial mode"),
            }
            self.mode = Some(mode);
        }

        let started = self.clock.now();
        for poll in &mut self.pollers {
            poll(&self.scheduler);
        }
        let report = self.scheduler.tick(mode);
        let elapsed = self.clock.now().saturating_sub(started);

        for fault in &report.faults {
            error!(
                command = %fault.command,
                error = %fault.error,
                at = %fault.timestamp,
                "uncaught command fault"
            );
        }

        self.stats.steps += 1;
        self.stats.faults += report.faults.len() as u64;
        self.stats.worst_step = self.stats.worst_step.max(elapsed);
        if elapsed > self.period {
            self.stats.overruns += 1;
            warn!(
                elapsed_ms = elapsed.as_secs_f64() * 1e3,
                period_ms = self.period.as_secs_f64() * 1e3,
                "loop overrun"
            );
        }
        report
    }

    /// Step at the loop period until `stop` returns `true`.  `stop` is checked
    /// before every step.
    pub fn run_until(&mut self, mut stop: impl FnMut() -> bool) -> &LoopStats {
        let mut deadline = Instant::now();
        while !stop() {
            self.step();
            deadline += self.period;
            let now = Instant::now();
            match deadline.checked_duration_since(now) {
                Some(remaining) => thread::sleep(remaining),
                None => deadline = now,
            }
        }
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_kernel::{CommandExt, FunctionalCommand, ManualClock, RunCommand};
    use lockstep_types::{CommandError, Resource};
    use std::cell::Cell;

    const PERIOD: Duration = Duration::from_millis(20);

    fn fixed(mode: RobotMode) -> impl FnMut() -> RobotMode {
        move || mode
    }

    #[test]
    fn step_ticks_the_scheduler_in_the_current_mode() {
        let scheduler = Scheduler::new();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let cmd = RunCommand::new("count", move || counter.set(counter.get() + 1)).into_handle();
        scheduler.schedule(&cmd).unwrap();

        let mode = Rc::new(Cell::new(RobotMode::Disabled));
        let source = mode.clone();
        let mut robot = RobotLoop::new(scheduler, PERIOD, move || source.get());

        let report = robot.step();
        assert_eq!(report.skipped, 1);
        assert_eq!(runs.get(), 0);
        assert_eq!(robot.mode(), Some(RobotMode::Disabled));

        mode.set(RobotMode::Teleop);
        robot.step();
        assert_eq!(runs.get(), 1);
        assert_eq!(robot.mode(), Some(RobotMode::Teleop));
        assert_eq!(robot.stats().steps, 2);
    }

    #[test]
    fn pollers_run_before_the_tick() {
        let scheduler = Scheduler::new();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let cmd = RunCommand::new("spin", move || flag.set(true)).into_handle();

        let mut robot = RobotLoop::new(scheduler, PERIOD, fixed(RobotMode::Teleop));
        let pending = Cell::new(Some(cmd.clone()));
        robot.add_poller(move |scheduler| {
            if let Some(handle) = pending.take() {
                let _ = scheduler.schedule(&handle);
            }
        });

        robot.step();
        assert!(ran.get());
        assert!(robot.scheduler().is_scheduled(&cmd));
    }

    #[test]
    fn faults_are_counted_and_released() {
        let scheduler = Scheduler::new();
        let arm = Resource::new("arm");
        let broken = FunctionalCommand::new("broken")
            .requiring(arm.clone())
            .on_execute(|| Err(CommandError::fault("broken", "encoder unplugged")))
            .into_handle();
        scheduler.schedule(&broken).unwrap();

        let mut robot = RobotLoop::new(scheduler, PERIOD, fixed(RobotMode::Autonomous));
        let report = robot.step();
        assert_eq!(report.faults.len(), 1);
        assert_eq!(robot.stats().faults, 1);
        assert!(robot.scheduler().requiring(&arm).is_none());

        robot.step();
        assert_eq!(robot.stats().faults, 1);
    }

    #[test]
    fn slow_steps_are_recorded_as_overruns() {
        let clock = ManualClock::default();
        let scheduler = Scheduler::new();
        let slow = {
            let clock = clock.clone();
            RunCommand::new("slow", move || clock.advance(Duration::from_millis(35))).into_handle()
        };
        scheduler.schedule(&slow).unwrap();

        let mut robot = RobotLoop::new(scheduler, PERIOD, fixed(RobotMode::Teleop))
            .with_clock(Rc::new(clock.clone()));
        robot.step();
        robot.step();
        assert_eq!(robot.stats().overruns, 2);
        assert_eq!(robot.stats().worst_step, Duration::from_millis(35));

        robot.scheduler().cancel(&slow);
        robot.step();
        assert_eq!(robot.stats().overruns, 2);
    }

    #[test]
    fn run_until_stops_when_asked() {
        let scheduler = Scheduler::new();
        let mut robot = RobotLoop::new(scheduler, Duration::from_millis(1), fixed(RobotMode::Teleop));
        let mut remaining = 5;
        let stats = robot.run_until(move || {
            if remaining == 0 {
                return true;
            }
            remaining -= 1;
            false
        });
        assert_eq!(stats.steps, 5);
    }
}
