//! Simulated subsystems.
//!
//! Each subsystem owns one or more [`Resource`]s and a handful of simulated
//! motor controllers.  Commands share a subsystem through
//! [`Shared`]`<T>` and claim its resources through their requirements.

use std::cell::RefCell;
use std::rc::Rc;

use lockstep_types::Resource;

pub type Shared<T> = Rc<RefCell<T>>;

/// Percent output applied to the feeder while it runs.
pub const FEEDER_SPEED: f64 = 0.6;

// ─────────────────────────────────────────────────────────────────────────────
// Motor
// ─────────────────────────────────────────────────────────────────────────────

/// A simulated percent-output motor controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    id: u8,
    inverted: bool,
    output: f64,
}

impl Motor {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            inverted: false,
            output: 0.0,
        }
    }

    pub fn inverted(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Command an output in `[-1, 1]`; values outside are clamped.
    pub fn set_percent_output(&mut self, percent: f64) {
        let percent = percent.clamp(-1.0, 1.0);
        self.output = if self.inverted { -percent } else { percent };
    }

    pub fn neutral_output(&mut self) {
        self.output = 0.0;
    }

    /// Output as seen at the motor terminals, after inversion.
    pub fn output(&self) -> f64 {
        self.output
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DriveTrain
// ─────────────────────────────────────────────────────────────────────────────

/// Differential drive with one motor per side.  The right side is mounted
/// mirrored, so its controller is inverted.
#[derive(Debug)]
pub struct DriveTrain {
    resource: Resource,
    left: Motor,
    right: Motor,
}

impl DriveTrain {
    pub fn new(left_id: u8, right_id: u8) -> Self {
        Self {
            resource: Resource::new("drive_train"),
            left: Motor::new(left_id),
            right: Motor::new(right_id).inverted(),
        }
    }

    pub fn shared(self) -> Shared<Self> {
        Rc::new(RefCell::new(self))
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Arcade drive: `forward` and `rotation` in `[-1, 1]`, positive rotation
    /// turns clockwise.
    pub fn drive(&mut self, forward: f64, rotation: f64) {
        let forward = forward.clamp(-1.0, 1.0);
        let rotation = rotation.clamp(-1.0, 1.0);
        let (mut left, mut right) = (forward + rotation, forward - rotation);
        let peak = left.abs().max(right.abs());
        if peak > 1.0 {
            left /= peak;
            right /= peak;
        }
        self.left.set_percent_output(left);
        self.right.set_percent_output(right);
    }

    pub fn stop(&mut self) {
        self.left.neutral_output();
        self.right.neutral_output();
    }

    /// `(left, right)` terminal outputs.
    pub fn outputs(&self) -> (f64, f64) {
        (self.left.output(), self.right.output())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// FrisbeeFlinger
// ─────────────────────────────────────────────────────────────────────────────

/// Shooter wheel plus the feeder that pushes discs into it.  The two are
/// separate resources so spinning up and feeding can overlap.
#[derive(Debug)]
pub struct FrisbeeFlinger {
    shooter: Resource,
    feeder: Resource,
    shooter_motor: Motor,
    feeder_motor: Motor,
    discs_fired: u32,
}

impl FrisbeeFlinger {
    pub fn new(feeder_id: u8, shooter_id: u8) -> Self {
        Self {
            shooter: Resource::new("shooter"),
            feeder: Resource::new("feeder"),
            shooter_motor: Motor::new(shooter_id),
            feeder_motor: Motor::new(feeder_id),
            discs_fired: 0,
        }
    }

    pub fn shared(self) -> Shared<Self> {
        Rc::new(RefCell::new(self))
    }

    pub fn shooter_resource(&self) -> &Resource {
        &self.shooter
    }

    pub fn feeder_resource(&self) -> &Resource {
        &self.feeder
    }

    pub fn spin_shooter(&mut self, speed: f64) {
        self.shooter_motor.set_percent_output(speed);
    }

    pub fn stop_shooter(&mut self) {
        self.shooter_motor.neutral_output();
    }

    /// Run the feeder.  A disc is counted as fired for every feed cycle that
    /// happens while the shooter wheel is turning.
    pub fn spin_feeder(&mut self) {
        if self.feeder_motor.output() == 0.0 && self.is_shooting() {
            self.discs_fired += 1;
        }
        self.feeder_motor.set_percent_output(FEEDER_SPEED);
    }

    pub fn stop_feeder(&mut self) {
        self.feeder_motor.neutral_output();
    }

    pub fn is_shooting(&self) -> bool {
        self.shooter_motor.output() != 0.0
    }

    pub fn shooter_output(&self) -> f64 {
        self.shooter_motor.output()
    }

    pub fn feeder_output(&self) -> f64 {
        self.feeder_motor.output()
    }

    pub fn discs_fired(&self) -> u32 {
        self.discs_fired
    }
}
