//! `lockstep-sim` – runs a simulated robot on the Lockstep scheduler.
//!
//! The robot has a differential drive train driven by a default command and a
//! frisbee flinger whose shooter and feeder are bound to scripted controller
//! buttons.  A scripted match timeline moves the robot from disabled through
//! autonomous into teleop.
//!
//! ```text
//! lockstep-sim [config.toml]
//! ```
//!
//! Ctrl-C stops the loop early.

mod commands;
mod controls;
mod robot;

use std::path::Path;
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use lockstep_kernel::{Clock, CommandExt, PrintCommand, Scheduler, SystemClock};
use lockstep_runtime::{LoopStats, RobotLoop, RuntimeConfig, RuntimeError, init_tracing};
use lockstep_types::{ConfigError, RobotMode};
use tracing::{info, warn};

use commands::{AutoTiming, DriveCommand, FeederCommand, ShooterCommand, autonomous_routine};
use controls::{Binding, MatchScript};
use robot::{DriveTrain, FrisbeeFlinger, Shared};

fn main() -> ExitCode {
    let cfg = match load_config(std::env::args().nth(1).as_deref().map(Path::new)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };
    let _guard = init_tracing("lockstep-sim", &cfg.log);

    print_banner();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot loop …".yellow().bold());
        shutdown_flag.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    println!(
        "  Loop period {} ms, match length {:.1} s\n",
        cfg.period_ms.to_string().bold(),
        cfg.sim.duration_s
    );

    match run(&cfg, &shutdown) {
        Ok(stats) => {
            print_summary(&stats);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Robot configuration error".red(), e);
            ExitCode::FAILURE
        }
    }
}

/// Load `path` when given, otherwise defaults; `LOCKSTEP_*` overrides apply
/// in both cases.
fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, RuntimeError> {
    match path {
        Some(path) => RuntimeConfig::load_from(path),
        None => {
            let mut cfg = RuntimeConfig::default();
            cfg.apply_env_overrides();
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Robot wiring
// ─────────────────────────────────────────────────────────────────────────────

struct Robot {
    drive: Shared<DriveTrain>,
    flinger: Shared<FrisbeeFlinger>,
}

/// Build the robot, register its default command and bindings, and return a
/// loop ready to run.
fn build(
    scheduler: Scheduler,
    script: &MatchScript,
    clock: Rc<dyn Clock>,
    period: Duration,
) -> Result<(Robot, RobotLoop), ConfigError> {
    let robot = Robot {
        drive: DriveTrain::new(10, 5).shared(),
        flinger: FrisbeeFlinger::new(3, 4).shared(),
    };

    let sticks = script.clone();
    let teleop_drive = DriveCommand::new(robot.drive.clone(), move || {
        // Pushing the stick right turns clockwise.
        (sticks.left_stick_y_squared(), -sticks.right_stick_x_squared())
    })
    .with_name("teleop_drive")
    .into_handle();
    let drive_resource = robot.drive.borrow().resource().clone();
    scheduler.set_default_command(&drive_resource, teleop_drive)?;

    let auto = autonomous_routine(&robot.drive, &robot.flinger, AutoTiming::default(), clock)?
        .into_handle();
    let shoot = ShooterCommand::new(robot.flinger.clone())
        .with_name("shoot")
        .into_handle();
    let feed = FeederCommand::new(robot.flinger.clone())
        .with_name("feed")
        .into_handle();
    let mark = PrintCommand::new("driver marked the match log")
        .with_name("mark")
        .into_handle();

    let mode_script = script.clone();
    let mut robot_loop = RobotLoop::new(scheduler, period, move || mode_script.mode());

    let s = script.clone();
    robot_loop.add_poller(
        Binding::while_true(move || s.mode() == RobotMode::Autonomous, auto).into_poller(),
    );
    let s = script.clone();
    robot_loop.add_poller(Binding::while_true(move || s.shooter_button(), shoot).into_poller());
    let s = script.clone();
    robot_loop.add_poller(Binding::while_true(move || s.feeder_button(), feed).into_poller());
    let s = script.clone();
    robot_loop.add_poller(Binding::on_true(move || s.mark_button(), mark).into_poller());

    Ok((robot, robot_loop))
}

fn run(cfg: &RuntimeConfig, shutdown: &AtomicBool) -> Result<LoopStats, ConfigError> {
    let clock: Rc<dyn Clock> = Rc::new(SystemClock::default());
    let script = MatchScript::new(clock.clone());
    let (robot, mut robot_loop) = build(Scheduler::new(), &script, clock.clone(), cfg.period())?;

    let duration = cfg.sim_duration();
    let mut next_status = Duration::ZERO;
    let status_robot = Robot {
        drive: robot.drive.clone(),
        flinger: robot.flinger.clone(),
    };
    let status_script = script.clone();
    robot_loop.add_poller(move |scheduler| {
        let now = status_script.elapsed();
        if now >= next_status {
            print_status(&status_script, &status_robot, scheduler);
            next_status = now + Duration::from_secs(1);
        }
    });

    info!(duration_s = duration.as_secs_f64(), "match started");
    let stats = robot_loop
        .run_until(|| shutdown.load(Ordering::SeqCst) || clock.now() >= duration)
        .clone();
    robot_loop.scheduler().cancel_all();
    info!(discs = robot.flinger.borrow().discs_fired(), "match over");
    Ok(stats)
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║        Lockstep Robot Simulator      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
}

fn print_status(script: &MatchScript, robot: &Robot, scheduler: &Scheduler) {
    let (left, right) = robot.drive.borrow().outputs();
    let flinger = robot.flinger.borrow();
    println!(
        "  {:>5.1}s {:<10} drive L{:+.2} R{:+.2}  shooter {:.2}  feeder {:.2}  [{}]",
        script.elapsed().as_secs_f64(),
        script.mode().to_string().bold(),
        left,
        right,
        flinger.shooter_output(),
        flinger.feeder_output(),
        scheduler.scheduled_names().join(", ").dimmed()
    );
}

fn print_summary(stats: &LoopStats) {
    println!();
    println!("  {} {} loop steps", "✓".green().bold(), stats.steps);
    let overruns = format!("{} overruns", stats.overruns);
    if stats.overruns == 0 {
        println!("    {}", overruns.green());
    } else {
        println!(
            "    {} (worst step {:.1} ms)",
            overruns.yellow(),
            stats.worst_step.as_secs_f64() * 1e3
        );
    }
    if stats.faults > 0 {
        println!("    {}", format!("{} uncaught faults", stats.faults).red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_kernel::ManualClock;

    fn simulated() -> (ManualClock, Robot, RobotLoop) {
        let clock = ManualClock::default();
        let script = MatchScript::new(Rc::new(clock.clone()));
        let (robot, robot_loop) = build(
            Scheduler::new(),
            &script,
            Rc::new(clock.clone()),
            Duration::from_millis(20),
        )
        .expect("valid robot");
        (clock, robot, robot_loop)
    }

    fn run_to(clock: &ManualClock, robot_loop: &mut RobotLoop, until: Duration) {
        while clock.now() < until {
            robot_loop.step();
            clock.advance(Duration::from_millis(20));
        }
    }

    #[test]
    fn default_drive_command_holds_the_drive_train_while_disabled() {
        let (_clock, robot, mut robot_loop) = simulated();
        robot_loop.step();
        assert_eq!(robot_loop.mode(), Some(RobotMode::Disabled));
        let owner = robot_loop
            .scheduler()
            .requiring(robot.drive.borrow().resource())
            .map(|h| h.name());
        assert_eq!(owner.as_deref(), Some("teleop_drive"));
        assert_eq!(robot.drive.borrow().outputs(), (0.0, 0.0));
    }

    #[test]
    fn autonomous_routine_takes_over_then_returns_the_drive() {
        let (clock, robot, mut robot_loop) = simulated();
        run_to(&clock, &mut robot_loop, Duration::from_millis(700));
        assert_eq!(robot_loop.mode(), Some(RobotMode::Autonomous));
        assert_eq!(
            robot_loop.scheduler().scheduled_names(),
            vec!["autonomous".to_string()]
        );

        // Drive 0.8 s, spin up 0.5 s, feed 1 s: done well before teleop.
        run_to(&clock, &mut robot_loop, Duration::from_millis(3400));
        assert_eq!(robot.flinger.borrow().discs_fired(), 1);
        assert_eq!(robot.flinger.borrow().shooter_output(), 0.0);

        run_to(&clock, &mut robot_loop, Duration::from_millis(3600));
        assert_eq!(robot_loop.mode(), Some(RobotMode::Teleop));
        let owner = robot_loop
            .scheduler()
            .requiring(robot.drive.borrow().resource())
            .map(|h| h.name());
        assert_eq!(owner.as_deref(), Some("teleop_drive"));
        assert_eq!(robot_loop.stats().faults, 0);
    }

    #[test]
    fn buttons_drive_the_flinger_in_teleop() {
        let (clock, robot, mut robot_loop) = simulated();
        // Teleop starts at 3.5 s; the shooter is held from +1 s, the feeder
        // from +2 s.
        run_to(&clock, &mut robot_loop, Duration::from_millis(5000));
        assert!(robot.flinger.borrow().is_shooting());
        assert_eq!(robot.flinger.borrow().feeder_output(), 0.0);

        run_to(&clock, &mut robot_loop, Duration::from_millis(5800));
        assert!(robot.flinger.borrow().feeder_output() > 0.0);

        run_to(&clock, &mut robot_loop, Duration::from_millis(7000));
        assert!(!robot.flinger.borrow().is_shooting());
        assert_eq!(robot.flinger.borrow().feeder_output(), 0.0);
        assert!(robot.flinger.borrow().discs_fired() >= 1);
    }

    #[test]
    fn mark_button_runs_a_one_shot_command() {
        let (clock, _robot, mut robot_loop) = simulated();
        // Teleop starts at 3.5 s; the mark tap lasts 200 ms.
        run_to(&clock, &mut robot_loop, Duration::from_millis(3500));
        let report = robot_loop.step();
        assert!(report.finished.contains(&"mark".to_string()));
        clock.advance(Duration::from_millis(20));

        run_to(&clock, &mut robot_loop, Duration::from_millis(3800));
        assert!(!robot_loop
            .scheduler()
            .scheduled_names()
            .contains(&"mark".to_string()));
        assert_eq!(robot_loop.stats().faults, 0);
    }

    #[test]
    fn missing_config_path_uses_defaults() {
        let cfg = load_config(None).expect("defaults are valid");
        assert_eq!(cfg.sim.duration_s, 10.0);
    }

    #[test]
    fn config_path_is_loaded() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("sim.toml");
        std::fs::write(&path, "[sim]\nduration_s = 1.5\n").expect("write");
        let cfg = load_config(Some(&path)).expect("load");
        assert_eq!(cfg.sim.duration_s, 1.5);
    }
}
