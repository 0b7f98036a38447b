//! `lockstep-runtime` – the outer driver around the command scheduler.
//!
//! # Modules
//!
//! - [`robot_loop`] – [`RobotLoop`][robot_loop::RobotLoop]: reads the robot
//!   mode, polls input bindings and ticks a
//!   [`Scheduler`][lockstep_kernel::Scheduler] once per loop period.  Uncaught
//!   command faults are logged once at `error` level; steps that exceed the
//!   period are counted as overruns.
//! - [`config`] – [`RuntimeConfig`][config::RuntimeConfig]: TOML
//!   configuration (loop period, log filter/format, simulation length) with
//!   `LOCKSTEP_*` environment overrides.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.  Set
//!   `OTEL_EXPORTER_OTLP_ENDPOINT` to enable trace export.

pub mod config;
pub mod robot_loop;
pub mod telemetry;

pub use config::{LogConfig, LogFormat, RuntimeConfig, RuntimeError, SimConfig};
pub use robot_loop::{LoopStats, RobotLoop};
pub use telemetry::{TracerProviderGuard, init_tracing};
