use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// An exclusively-ownable capability of the robot (e.g. "drive_train").
///
/// Identity is the UUID minted by [`Resource::new`]: clones compare equal,
/// two resources created with the same name do not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    id: Uuid,
    name: String,
}

impl Resource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Human-readable label, used for logs only.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Resource {}

impl Hash for Resource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Resource {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Resource {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Operating mode reported by the outer loop driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RobotMode {
    /// Actuators are disabled; only commands that run when disabled execute.
    #[default]
    Disabled,
    /// Operator-controlled.
    Teleop,
    /// Pre-programmed routine.
    Autonomous,
    /// Self-test.
    Test,
}

impl RobotMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, RobotMode::Disabled)
    }
}

impl fmt::Display for RobotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotMode::Disabled => write!(f, "disabled"),
            RobotMode::Teleop => write!(f, "teleop"),
            RobotMode::Autonomous => write!(f, "autonomous"),
            RobotMode::Test => write!(f, "test"),
        }
    }
}

/// Runtime fault raised by a command hook.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandError {
    #[error("Command Fault in {command}: {details}")]
    Fault { command: String, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    /// The command was asked to run a hook while one of its own hooks was
    /// still on the stack.
    #[error("Reentrant Call: {command} is already running a lifecycle hook")]
    Reentrant { command: String },
}

impl CommandError {
    pub fn fault(command: impl Into<String>, details: impl Into<String>) -> Self {
        CommandError::Fault {
            command: command.into(),
            details: details.into(),
        }
    }
}

/// Composition or registration mistake, reported before anything runs.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("Overlapping Requirements in {group}: {resource} is required by more than one child")]
    OverlappingRequirements { group: String, resource: String },

    #[error("Invalid Default Command for {resource}: {details}")]
    InvalidDefaultCommand { resource: String, details: String },
}

pub type CommandResult<T> = Result<T, CommandError>;

/// One uncaught fault observed by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultReport {
    pub command: String,
    pub error: CommandError,
    pub timestamp: DateTime<Utc>,
}

impl FaultReport {
    pub fn new(command: impl Into<String>, error: CommandError) -> Self {
        Self {
            command: command.into(),
            error,
            timestamp: Utc::now(),
        }
    }
}
