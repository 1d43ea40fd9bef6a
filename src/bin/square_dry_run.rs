//! Runs the square test without ROS.
//!
//! The robot's pose is predicted from the published commands and three
//! simulated infrared sensors read the distance to the walls of an arena
//! around the square. Sensors run on their own task and feed the shared
//! proximity monitor, as the ROS callbacks would.

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use square_test_core::common::types::Pose2D;
use square_test_core::common::Side;
use square_test_core::config::SquareConfig;
use square_test_core::logging::{logger_init, LevelFilter};
use square_test_core::perception::localization::DeadReckoning;
use square_test_core::perception::proximity::ProximityMonitor;
use square_test_core::perception::sensors::{Arena, RangeSensor, SimulatedRangeSensor};
use square_test_core::SquareTestCore;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};

/// Simulated sensor rate, faster than the control loop like the real IR boards
const SENSOR_PERIOD: Duration = Duration::from_millis(40);

/// Longest range the simulated sensors report, in meters
const SENSOR_MAX_RANGE: f64 = 0.8;

#[derive(Debug, Parser)]
#[command(about = "Drive the square test against a simulated arena")]
struct Args {
    /// Parameter file, defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Also append log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Stop after this many seconds (one lap takes 56 s with the defaults)
    #[arg(long, default_value_t = 60.0)]
    duration_secs: f64,

    /// Gap between the square and each arena wall, in meters
    #[arg(long, default_value_t = 0.1)]
    arena_margin: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger_init(args.log_level, args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => SquareConfig::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SquareConfig::default(),
    };
    let run_for = Duration::try_from_secs_f64(args.duration_secs)
        .context("--duration-secs must be a non-negative number")?;

    let mut core = SquareTestCore::new(&config)?;
    core.init()?;

    let arena = Arena::around_square(config.motion.side_length, args.arena_margin);
    info!("Simulated arena: {:?} to {:?}", arena.min, arena.max);

    let (pose_tx, pose_rx) = watch::channel::<Pose2D>((0.0, 0.0, 0.0));
    let sensors: Vec<SimulatedRangeSensor> = Side::ALL
        .into_iter()
        .map(|side| SimulatedRangeSensor::new(side, arena, config.proximity.unit, SENSOR_MAX_RANGE))
        .collect();
    let sensor_task = tokio::spawn(run_sensors(sensors, core.monitor(), pose_rx));

    let period = config.loop_period()?;
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut odometry = DeadReckoning::new();
    let start = Instant::now();

    info!("Square test dry run started, running for {:?}", run_for);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        if !next_tick(&mut interval, &mut ctrl_c).await {
            info!("Interrupted");
            break;
        }

        let now = Instant::now();
        if now.duration_since(start) >= run_for {
            break;
        }

        let out = core.step(now);
        if out.transitioned {
            let (x, y, theta) = odometry.get_pose();
            info!(
                "Now {} at predicted pose x={:.3}, y={:.3}, theta={:.3}",
                out.state, x, y, theta
            );
        }

        // The command is held until the next tick
        odometry.integrate(out.command, period);
        let pose = odometry.get_pose();
        debug!(
            "cmd linear={:.3}, angular={:.3}, pose=({:.3}, {:.3}, {:.3})",
            out.command.linear_x, out.command.angular_z, pose.0, pose.1, pose.2
        );
        if !share_pose(&pose_tx, pose) {
            break;
        }
    }

    // Dropping the sender ends the sensor task
    drop(pose_tx);
    sensor_task.await?;

    let sequencer = core.control().sequencer();
    info!(
        "Dry run finished: {} sides, {} laps",
        sequencer.sides_completed(),
        sequencer.laps_completed()
    );
    core.shutdown()?;
    Ok(())
}

/// Wait for the next loop tick. Returns false once `shutdown` has completed.
async fn next_tick<F: Future + Unpin>(interval: &mut Interval, shutdown: &mut F) -> bool {
    tokio::select! {
        _ = interval.tick() => true,
        _ = shutdown => false,
    }
}

/// Hand the predicted pose to the sensor task. Returns false if it has stopped.
fn share_pose(pose_tx: &watch::Sender<Pose2D>, pose: Pose2D) -> bool {
    if pose_tx.send(pose).is_err() {
        error!("Sensor task has stopped, ending the dry run");
        return false;
    }
    true
}

async fn run_sensors(
    sensors: Vec<SimulatedRangeSensor>,
    monitor: Arc<ProximityMonitor>,
    mut pose_rx: watch::Receiver<Pose2D>,
) {
    let mut interval = tokio::time::interval(SENSOR_PERIOD);
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            changed = pose_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
        }
        let pose = *pose_rx.borrow();
        for sensor in &sensors {
            monitor.update(sensor.side(), sensor.measure(pose));
        }
    }
    debug!("Sensor task stopped");
}
