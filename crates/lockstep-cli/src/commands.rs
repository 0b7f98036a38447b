//! Robot commands: driving, shooting, feeding and the autonomous routine.

use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Duration;

use lockstep_kernel::{Clock, Command, CommandExt, PrintCommand, Target, Wait};
use lockstep_types::{CommandResult, ConfigError, Resource};

use crate::robot::{DriveTrain, FrisbeeFlinger, Shared};

// ─────────────────────────────────────────────────────────────────────────────
// DriveCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Drives from a `(forward, rotation)` source until interrupted, then stops
/// the drive train.
pub struct DriveCommand {
    drive: Shared<DriveTrain>,
    input: Box<dyn FnMut() -> (f64, f64)>,
    requirements: BTreeSet<Resource>,
}

impl DriveCommand {
    pub fn new(drive: Shared<DriveTrain>, input: impl FnMut() -> (f64, f64) + 'static) -> Self {
        let requirements = BTreeSet::from([drive.borrow().resource().clone()]);
        Self {
            drive,
            input: Box::new(input),
            requirements,
        }
    }
}

impl Command for DriveCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn execute(&mut self) -> CommandResult<()> {
        let (forward, rotation) = (self.input)();
        self.drive.borrow_mut().drive(forward, rotation);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self) {
        self.drive.borrow_mut().stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ShooterCommand / FeederCommand
// ─────────────────────────────────────────────────────────────────────────────

/// Holds the shooter wheel at full speed.
pub struct ShooterCommand {
    flinger: Shared<FrisbeeFlinger>,
    requirements: BTreeSet<Resource>,
}

impl ShooterCommand {
    pub fn new(flinger: Shared<FrisbeeFlinger>) -> Self {
        let requirements = BTreeSet::from([flinger.borrow().shooter_resource().clone()]);
        Self {
            flinger,
            requirements,
        }
    }
}

impl Command for ShooterCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.flinger.borrow_mut().spin_shooter(1.0);
        Ok(())
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self) {
        self.flinger.borrow_mut().stop_shooter();
    }
}

/// Runs the feeder.
pub struct FeederCommand {
    flinger: Shared<FrisbeeFlinger>,
    requirements: BTreeSet<Resource>,
}

impl FeederCommand {
    pub fn new(flinger: Shared<FrisbeeFlinger>) -> Self {
        let requirements = BTreeSet::from([flinger.borrow().feeder_resource().clone()]);
        Self {
            flinger,
            requirements,
        }
    }
}

impl Command for FeederCommand {
    fn requirements(&self) -> &BTreeSet<Resource> {
        &self.requirements
    }

    fn execute(&mut self) -> CommandResult<()> {
        self.flinger.borrow_mut().spin_feeder();
        Ok(())
    }

    fn is_finished(&self) -> bool {
        false
    }

    fn end(&mut self) {
        self.flinger.borrow_mut().stop_feeder();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Autonomous
// ─────────────────────────────────────────────────────────────────────────────

/// Timing of the autonomous routine.
#[derive(Debug, Clone, Copy)]
pub struct AutoTiming {
    pub drive: Duration,
    pub spin_up: Duration,
    pub feed: Duration,
}

impl Default for AutoTiming {
    fn default() -> Self {
        Self {
            drive: Duration::from_millis(800),
            spin_up: Duration::from_millis(500),
            feed: Duration::from_millis(1000),
        }
    }
}

/// Drive forward, then spin the shooter up and feed while it keeps spinning.
/// Every stage is timed on `clock`.
///
/// ```text
/// drive(0.5, 0) ─timeout─► ┌ shooter ──────────────────────┐ ─► print
///                          └ wait(spin_up) ─► feeder(feed) ┘ (race)
/// ```
pub fn autonomous_routine(
    drive: &Shared<DriveTrain>,
    flinger: &Shared<FrisbeeFlinger>,
    timing: AutoTiming,
    clock: Rc<dyn Clock>,
) -> Result<Target, ConfigError> {
    let feed = FeederCommand::new(flinger.clone()).with_timeout_on(timing.feed, clock.clone());
    let shoot = ShooterCommand::new(flinger.clone())
        .race_with(Wait::with_clock(timing.spin_up, clock.clone()).and_then(feed))?;

    Ok(DriveCommand::new(drive.clone(), || (0.5, 0.0))
        .with_timeout_on(timing.drive, clock)
        .and_then(shoot)
        .and_then(PrintCommand::new("autonomous routine complete"))
        .with_name("autonomous"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_kernel::{ManualClock, Scheduler};
    use lockstep_types::RobotMode;

    #[test]
    fn drive_command_follows_input_and_stops_on_interrupt() {
        let drive = DriveTrain::new(10, 5).shared();
        let scheduler = Scheduler::new();
        let cmd = DriveCommand::new(drive.clone(), || (0.25, 0.0)).into_handle();

        scheduler.schedule(&cmd).unwrap();
        scheduler.tick(RobotMode::Teleop);
        assert_eq!(drive.borrow().outputs(), (0.25, -0.25));
        assert_eq!(
            scheduler.requiring(drive.borrow().resource()),
            Some(cmd.clone())
        );

        scheduler.cancel(&cmd);
        assert_eq!(drive.borrow().outputs(), (0.0, 0.0));
    }

    #[test]
    fn shooter_and_feeder_run_together() {
        let flinger = FrisbeeFlinger::new(3, 4).shared();
        let scheduler = Scheduler::new();
        let shooter = ShooterCommand::new(flinger.clone()).into_handle();
        let feeder = FeederCommand::new(flinger.clone()).into_handle();

        scheduler.schedule(&shooter).unwrap();
        scheduler.schedule(&feeder).unwrap();
        scheduler.tick(RobotMode::Teleop);
        assert!(scheduler.is_scheduled(&shooter));
        assert!(scheduler.is_scheduled(&feeder));
        assert_eq!(flinger.borrow().discs_fired(), 1);

        scheduler.cancel_all();
        assert_eq!(flinger.borrow().shooter_output(), 0.0);
        assert_eq!(flinger.borrow().feeder_output(), 0.0);
    }

    #[test]
    fn autonomous_routine_claims_every_subsystem() {
        let drive = DriveTrain::new(10, 5).shared();
        let flinger = FrisbeeFlinger::new(3, 4).shared();
        let clock = Rc::new(ManualClock::default());
        let routine = autonomous_routine(&drive, &flinger, AutoTiming::default(), clock).unwrap();

        assert_eq!(routine.name(), "autonomous");
        assert!(routine.has_requirement(drive.borrow().resource()));
        assert!(routine.has_requirement(flinger.borrow().shooter_resource()));
        assert!(routine.has_requirement(flinger.borrow().feeder_resource()));
    }

    #[test]
    fn zero_length_routine_still_runs_every_stage() {
        let drive = DriveTrain::new(10, 5).shared();
        let flinger = FrisbeeFlinger::new(3, 4).shared();
        let timing = AutoTiming {
            drive: Duration::ZERO,
            spin_up: Duration::ZERO,
            feed: Duration::ZERO,
        };
        let scheduler = Scheduler::new();
        let routine = autonomous_routine(&drive, &flinger, timing, Rc::new(ManualClock::default()))
            .unwrap()
            .into_handle();

        scheduler.schedule(&routine).unwrap();
        let mut ticks = 0;
        while scheduler.is_scheduled(&routine) && ticks < 20 {
            scheduler.tick(RobotMode::Autonomous);
            ticks += 1;
        }
        assert!(!scheduler.is_scheduled(&routine));
        assert_eq!(drive.borrow().outputs(), (0.0, 0.0));
        assert_eq!(flinger.borrow().shooter_output(), 0.0);
        assert_eq!(flinger.borrow().feeder_output(), 0.0);
        assert_eq!(flinger.borrow().discs_fired(), 1);
    }
}
