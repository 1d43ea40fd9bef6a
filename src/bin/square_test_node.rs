use anyhow::{Context as _, Error, Result};
use clap::Parser;
use log::{error, info};
use rclrs::{Context, CreateBasicExecutor, Node, RclrsErrorFilter, SpinOptions, QOS_PROFILE_DEFAULT};
use square_test_core::common::{RangeReading, Side};
use square_test_core::config::SquareConfig;
use square_test_core::logging::{logger_init, LevelFilter};
use square_test_core::perception::proximity::ProximityMonitor;
use square_test_core::SquareTestCore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use geometry_msgs::msg::Twist;
use sensor_msgs::msg::Range;
use std_msgs::msg::String as StringMsg;

#[derive(Debug, Parser)]
#[command(about = "Drive the robot around a square, warning when obstacles are close")]
struct Args {
    /// Parameter file, defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Also append log records to this file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

struct SquareTestNode {
    core: Mutex<SquareTestCore>,
    _node: Arc<Node>,
    cmd_vel_publisher: Arc<rclrs::Publisher<Twist>>,
    state_publisher: Arc<rclrs::Publisher<StringMsg>>,
    range_subscriptions: Mutex<Vec<Arc<rclrs::Subscription<Range>>>>,
    running: Arc<Mutex<bool>>,
    period: Duration,
}

impl SquareTestNode {
    pub fn new(executor: &rclrs::Executor, name: &str, config: SquareConfig) -> Result<Arc<Self>> {
        let node = executor.create_node(name)?;

        let period = config.loop_period()?;
        let mut core = SquareTestCore::new(&config)?;
        core.init()?;

        info!(
            "Topics: cmd_vel={}, state={}, front={}, left={}, right={}",
            config.topics.cmd_vel,
            config.topics.state,
            config.topics.front,
            config.topics.left,
            config.topics.right
        );

        let cmd_vel_publisher =
            node.create_publisher::<Twist>(&config.topics.cmd_vel, QOS_PROFILE_DEFAULT)?;
        let state_publisher =
            node.create_publisher::<StringMsg>(&config.topics.state, QOS_PROFILE_DEFAULT)?;

        let monitor = core.monitor();

        let square_test_node = Arc::new(SquareTestNode {
            core: Mutex::new(core),
            _node: Arc::clone(&node),
            cmd_vel_publisher,
            state_publisher,
            range_subscriptions: Mutex::new(Vec::new()),
            running: Arc::new(Mutex::new(true)),
            period,
        });

        // One subscription per sensor, all sharing the same reading type
        for (side, topic) in [
            (Side::Front, &config.topics.front),
            (Side::Left, &config.topics.left),
            (Side::Right, &config.topics.right),
        ] {
            let subscription =
                Self::subscribe_range(&node, topic, side, Arc::clone(&monitor))?;
            square_test_node
                .range_subscriptions
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(subscription);
        }

        // Start a thread to run the control loop
        let square_test_node_clone = Arc::clone(&square_test_node);
        let running_clone = Arc::clone(&square_test_node.running);

        thread::spawn(move || {
            while *running_clone.lock().unwrap_or_else(PoisonError::into_inner) {
                let started = Instant::now();
                square_test_node_clone.timer_callback(started);
                thread::sleep(square_test_node_clone.period.saturating_sub(started.elapsed()));
            }
        });

        Ok(square_test_node)
    }

    fn subscribe_range(
        node: &Node,
        topic: &str,
        side: Side,
        monitor: Arc<ProximityMonitor>,
    ) -> Result<Arc<rclrs::Subscription<Range>>> {
        let subscription = node.create_subscription::<Range, _>(
            topic,
            QOS_PROFILE_DEFAULT,
            move |msg: Range| {
                monitor.update(side, RangeReading::new(f64::from(msg.range)));
            },
        )?;
        Ok(subscription)
    }

    fn timer_callback(&self, now: Instant) {
        let out = self
            .core
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .step(now);

        let mut twist = Twist::default();
        twist.linear.x = out.command.linear_x;
        twist.angular.z = out.command.angular_z;

        if let Err(e) = self.cmd_vel_publisher.publish(&twist) {
            error!("Failed to publish velocity command: {}", e);
        }

        if out.transitioned {
            let msg = StringMsg {
                data: out.state.to_string(),
            };
            if let Err(e) = self.state_publisher.publish(&msg) {
                error!("Failed to publish sequencer state: {}", e);
            }
        }
    }

    fn stop(&self) {
        if let Ok(mut running) = self.running.lock() {
            *running = false;
        }

        let mut core = self.core.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = core.shutdown() {
            error!("Failed to shut down core: {}", e);
        }
        if let Err(e) = self.cmd_vel_publisher.publish(&Twist::default()) {
            error!("Failed to publish stop command: {}", e);
        }
    }
}

impl Drop for SquareTestNode {
    fn drop(&mut self) {
        // Set running to false when the node is dropped
        if let Ok(mut running) = self.running.lock() {
            *running = false;
        }
    }
}

fn main() -> Result<(), Error> {
    // Everything after --ros-args belongs to rcl
    let args = Args::parse_from(std::env::args().take_while(|arg| arg != "--ros-args"));
    logger_init(args.log_level, args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => SquareConfig::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SquareConfig::default(),
    };

    info!("Initializing square test node...");

    let mut executor = Context::default_from_env()?.create_basic_executor();
    let square_test_node = SquareTestNode::new(&executor, "square_test", config)?;

    info!("Square test node initialized. Starting to spin...");

    let result = executor
        .spin(SpinOptions::default())
        .first_error()
        .map_err(|err| err.into());

    square_test_node.stop();
    result
}
