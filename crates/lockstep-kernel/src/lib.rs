//! `lockstep-kernel` – Command Scheduling & Arbitration
//!
//! The cooperative core of Lockstep. It does not drive hardware; it decides
//! which command owns which [`Resource`][lockstep_types::Resource] on every
//! tick and walks each command through its lifecycle.
//!
//! # Modules
//!
//! - [`command`] – the [`Command`] contract and the [`CommandExt`]
//!   combinators (`with_timeout`, `until`, `and_then`, `race_with`, …).
//! - [`handle`] – [`CommandHandle`]: the shared, identity-comparable form of
//!   a command that the [`Scheduler`] tracks.
//! - [`scheduler`] – [`Scheduler`]: the registry of scheduled commands,
//!   resource owners and default commands, driven by [`Scheduler::tick`].
//! - Groups – [`Sequential`], [`Parallel`], [`Race`], [`Repeat`],
//!   [`Conditional`].
//! - Decorators – [`Proxy`], [`Recovery`], [`Target`], [`Wait`],
//!   [`WaitUntil`].
//! - [`primitives`] – closure-backed leaf commands.
//! - [`clock`] – time sources for the timing primitives.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lockstep_kernel::{CommandExt, RunCommand, Scheduler};
//! use lockstep_types::{Resource, RobotMode};
//!
//! let drive = Resource::new("drive_train");
//! let scheduler = Scheduler::new();
//!
//! let crawl = RunCommand::new("crawl", || {})
//!     .requiring(drive.clone())
//!     .with_timeout(Duration::from_secs(2))
//!     .into_handle();
//!
//! assert!(scheduler.schedule(&crawl).unwrap().took_effect());
//! scheduler.tick(RobotMode::Teleop);
//! assert!(scheduler.requiring(&drive).is_some());
//! ```

pub mod clock;
pub mod command;
pub mod conditional;
mod group;
pub mod handle;
pub mod parallel;
pub mod primitives;
pub mod proxy;
pub mod race;
pub mod recovery;
pub mod repeat;
pub mod scheduler;
pub mod sequential;
pub mod target;
pub mod wait;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandExt, Condition};
pub use conditional::Conditional;
pub use handle::{CommandHandle, CommandId};
pub use parallel::Parallel;
pub use primitives::{FunctionalCommand, InstantCommand, NullCommand, PrintCommand, RunCommand};
pub use proxy::Proxy;
pub use race::Race;
pub use recovery::Recovery;
pub use repeat::Repeat;
pub use scheduler::{ScheduleOutcome, Scheduler, TickReport};
pub use sequential::Sequential;
pub use target::Target;
pub use wait::{Wait, WaitUntil};
