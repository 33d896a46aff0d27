use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{broadcast, mpsc, watch};

use crate::config::Config;
use crate::core::detection::{DetectionSnapshot, LabelHistory};
use crate::core::pose::Odometry;
use crate::device::{
    Camera, GpioLineSensor, LineSensorDevice, MotionDevice, ServoChassis,
};
use crate::kernel::courier::Courier;
use crate::runtime::operand::Operand;
use crate::vision::{CommandDetector, InferenceSource};
use crate::workspace;

use super::exec;
use super::motion::{self, Chassis};
use super::task::TaskResources;
use super::RuntimeContext;

/// Construct the runtime from the configuration and run it to completion.
///
/// The runtime core is created and initialized by the configuration. Any
/// errors are fatal errors at this point: a missing device aborts the launch
/// before any service is spawned.
pub(crate) async fn launch(config: &Config) -> super::Result {
    workspace::setup_if_not_exists(&config.workspace).map_err(super::Error::Io)?;
    let _lock = workspace::lock(&config.workspace)?;

    debug!("Runtime version {}", crate::consts::VERSION);

    let operand = Courier::from_config(config);

    info!("{}", operand.intro());

    let motion_device: Box<dyn MotionDevice> = Box::new(ServoChassis::new(&config.chassis)?);
    let line_sensor: Box<dyn LineSensorDevice> = Box::new(GpioLineSensor::new(&config.line_sensor)?);

    let still_camera = Camera::new(
        "camera",
        &config.vision.capture_command,
        config.workspace.join("frame.jpg"),
    )?;
    let live_camera = Camera::new(
        "livecam",
        &config.vision.live_command,
        config.workspace.join("live.jpg"),
    )?;
    let detector = CommandDetector::new(
        &config.vision.detect_command,
        config.vision.confidence_margin,
    )?;

    if config.enable_test {
        info!("Configuration and devices validated");

        return Ok(());
    }

    still_camera.initialize(&config.vision.camera_setup);

    let runtime = RuntimeContext::new();

    // Graceful shutdown on termination request.
    {
        let shutdown_tx = runtime.shutdown.0.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Termination requested");

                let _ = shutdown_tx.send(());
            }
        });
    }

    let (motion_tx, motion_rx) = mpsc::channel(crate::consts::QUEUE_SIZE_COMMAND);
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(DetectionSnapshot::default()));
    let (available_tx, available_rx) = broadcast::channel(crate::consts::QUEUE_SIZE_SIGNAL);
    let (command_tx, command_rx) = mpsc::channel(crate::consts::QUEUE_SIZE_OPERATOR);
    let (live_tx, _live_rx) = watch::channel(None);

    let history = Arc::new(Mutex::new(LabelHistory::new()));
    let odometry = Arc::new(RwLock::new(Odometry::new()));

    tokio::spawn(motion::motion_sink(
        motion_rx,
        motion_device,
        config.enable_motion,
        config.slow_motion,
        runtime.shutdown_signal(),
    ));

    let source = InferenceSource::new(
        still_camera,
        Box::new(detector),
        snapshot_tx,
        available_tx,
        history.clone(),
    );
    tokio::spawn(source.run(runtime.shutdown_signal()));

    runtime.spawn_background_task(crate::vision::live_camera_service(live_camera, live_tx));

    let resources = TaskResources {
        chassis: Chassis::new(motion_tx),
        line_sensor: Arc::new(Mutex::new(line_sensor)),
        odometry,
        snapshot: snapshot_rx,
    };

    // The operator surface stays open for the lifetime of the daemon.
    let _command_tx = command_tx;

    exec::mission_service(
        operand,
        config.clone(),
        resources,
        available_rx,
        command_rx,
        runtime.shutdown_signal(),
        history,
    )
    .await
}
