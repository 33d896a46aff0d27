use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::core::detection::DetectionSnapshot;
use crate::core::mission::MissionPhase;
use crate::core::pose::Odometry;
use crate::device::LineSensorDevice;

use super::motion::Chassis;
use super::program::{Context, Program};

/// Task lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Task created, not started.
    Idle = 0x00,
    /// Task is running its program.
    Running = 0x01,
    /// Task holds position, program decisions suspended.
    Paused = 0x02,
    /// Task ended without finishing the mission.
    Stopped = 0x03,
    /// Terminal program completed, mission finished.
    Finished = 0x10,
}

impl TryFrom<u8> for TaskStatus {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(TaskStatus::Idle),
            0x01 => Ok(TaskStatus::Running),
            0x02 => Ok(TaskStatus::Paused),
            0x03 => Ok(TaskStatus::Stopped),
            0x10 => Ok(TaskStatus::Finished),
            _ => Err(()),
        }
    }
}

/// Why the poll loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Program completed, start the given phase next.
    Advance(MissionPhase),
    /// Terminal program completed.
    Finished,
    /// Stopped by the operator or the runtime.
    Stopped,
    /// A device failed mid-task.
    Fault,
}

/// Shared control block between the poll loop and its supervisors.
///
/// Every field is written by one side and read by the other, so all of them
/// carry ordering guarantees; plain fields would race.
pub struct TaskControl {
    status: AtomicU8,
    /// A new inference cycle is waiting to be consumed.
    pending: AtomicBool,
    /// Second consecutive cycle since the last pause or resume.
    settled: AtomicBool,
    /// Start of the current motion burst.
    burst_start: Mutex<Instant>,
}

impl TaskControl {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(TaskStatus::Idle as u8),
            pending: AtomicBool::new(false),
            settled: AtomicBool::new(false),
            burst_start: Mutex::new(Instant::now()),
        }
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus::try_from(self.status.load(Ordering::SeqCst)).unwrap_or(TaskStatus::Stopped)
    }

    /// Signal that a new detection snapshot is available.
    ///
    /// Signals collapse; the poll loop consumes at most one per pass.
    pub fn notify_inference_available(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Time since the current motion burst started.
    pub fn burst_elapsed(&self) -> Duration {
        self.burst_start.lock().unwrap().elapsed()
    }

    fn set_status(&self, status: TaskStatus) {
        self.status.store(status as u8, Ordering::SeqCst);
    }

    fn transition(&self, from: TaskStatus, to: TaskStatus) -> bool {
        self.status
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn stamp_burst(&self) {
        *self.burst_start.lock().unwrap() = Instant::now();
    }
}

/// Everything a task needs besides its program.
#[derive(Clone)]
pub struct TaskResources {
    pub chassis: Chassis,
    pub line_sensor: Arc<Mutex<Box<dyn LineSensorDevice>>>,
    pub odometry: Arc<RwLock<Odometry>>,
    pub snapshot: watch::Receiver<Arc<DetectionSnapshot>>,
}

/// Handle on a spawned task.
pub struct TaskHandle {
    phase: MissionPhase,
    control: Arc<TaskControl>,
    chassis: Chassis,
    pub join: JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn status(&self) -> TaskStatus {
        self.control.status()
    }

    pub fn control(&self) -> Arc<TaskControl> {
        self.control.clone()
    }

    pub fn burst_elapsed(&self) -> Duration {
        self.control.burst_elapsed()
    }

    /// Suspend program decisions and stop the chassis at once.
    ///
    /// Discards any armed second frame; a resumed task must not trust a
    /// snapshot captured before the pause. Pausing a paused task is a no-op.
    pub fn pause(&self) {
        if self.control.transition(TaskStatus::Running, TaskStatus::Paused) {
            self.control.settled.store(false, Ordering::SeqCst);
            self.chassis.halt_now();

            info!("Task ({}) paused", self.phase);
        }
    }

    /// Resume program decisions.
    ///
    /// Two inference cycles must pass before a completion check is trusted
    /// again. Resuming a running task is a no-op.
    pub fn resume(&self) {
        if self.control.transition(TaskStatus::Paused, TaskStatus::Running) {
            self.control.settled.store(false, Ordering::SeqCst);
            self.control.stamp_burst();

            info!("Task ({}) resumed", self.phase);
        }
    }

    /// Request cooperative stop.
    ///
    /// The poll loop observes the request at the top of its next pass and
    /// exits after a final chassis stop; join the handle to guarantee the
    /// chassis has been released. Stopping a stopped task is a no-op.
    pub fn stop(&self) {
        let stopped = self.control.transition(TaskStatus::Running, TaskStatus::Stopped)
            || self.control.transition(TaskStatus::Paused, TaskStatus::Stopped)
            || self.control.transition(TaskStatus::Idle, TaskStatus::Stopped);

        if stopped {
            self.chassis.halt_now();

            info!("Task ({}) stop requested", self.phase);
        }
    }

    /// Signal that a new detection snapshot is available.
    pub fn notify_inference_available(&self) {
        self.control.notify_inference_available();
    }
}

/// The generic task engine.
///
/// Owns one program and runs it to completion on its own task, polling its
/// control flags once per bounded interval instead of spinning.
pub struct TaskState {
    phase: MissionPhase,
    program: Box<dyn Program>,
    resources: TaskResources,
    control: Arc<TaskControl>,
}

impl TaskState {
    pub fn new(phase: MissionPhase, program: Box<dyn Program>, resources: TaskResources) -> Self {
        Self {
            phase,
            program,
            resources,
            control: Arc::new(TaskControl::new()),
        }
    }

    /// Start the poll loop.
    pub fn start(self) -> TaskHandle {
        let phase = self.phase;
        let control = self.control.clone();
        let chassis = self.resources.chassis.clone();

        info!("Start task ({})", phase);

        let join = tokio::spawn(run(self.phase, self.program, self.resources, self.control));

        TaskHandle {
            phase,
            control,
            chassis,
            join,
        }
    }
}

/// One poll pass per interval tick until the program completes or the task
/// is stopped.
///
/// A completion decision is never made on the first snapshot following a
/// pause or resume: the frame captured right after a movement change may
/// show the robot mid-motion, so the first cycle only arms the check and the
/// second one is trusted.
async fn run(
    phase: MissionPhase,
    mut program: Box<dyn Program>,
    resources: TaskResources,
    control: Arc<TaskControl>,
) -> TaskOutcome {
    control.set_status(TaskStatus::Running);
    control.stamp_burst();

    let snapshot_rx = resources.snapshot.clone();

    let mut context = Context::new(
        resources.chassis.clone(),
        resources.line_sensor.clone(),
        resources.odometry.clone(),
        snapshot_rx.borrow().clone(),
    );

    if let Err(e) = program.boot(&mut context).await {
        error!("Task ({}) boot fault: {}", phase, e);

        resources.chassis.halt().await;
        control.set_status(TaskStatus::Stopped);

        return TaskOutcome::Fault;
    }

    let mut fruitless_checks: u32 = 0;

    let mut interval = tokio::time::interval(crate::consts::TASK_POLL_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    let outcome = loop {
        interval.tick().await;

        if control.status() == TaskStatus::Stopped {
            break TaskOutcome::Stopped;
        }

        context.snapshot = snapshot_rx.borrow().clone();

        if control.pending.swap(false, Ordering::SeqCst) {
            program.on_inference();

            if control.settled.swap(false, Ordering::SeqCst) {
                if program.can_terminate(&context) {
                    if let Err(e) = program.term_action(&mut context).await {
                        error!("Task ({}) termination fault: {}", phase, e);
                        break TaskOutcome::Fault;
                    }

                    break match program.successor() {
                        Some(next) => TaskOutcome::Advance(next),
                        None => TaskOutcome::Finished,
                    };
                }

                fruitless_checks += 1;
                if fruitless_checks % crate::consts::SCAN_WARN_CYCLES == 0 {
                    warn!(
                        "Task ({}) still searching after {} trusted cycles",
                        phase, fruitless_checks
                    );
                }

                // Trust established and the task is not done; move again.
                control.transition(TaskStatus::Paused, TaskStatus::Running);
                control.stamp_burst();
                program.on_resume();
            } else {
                control.settled.store(true, Ordering::SeqCst);
            }
        }

        match control.status() {
            TaskStatus::Paused => context.chassis().halt().await,
            TaskStatus::Running => {
                if let Err(e) = program.step(&mut context).await {
                    error!("Task ({}) fault: {}", phase, e);
                    break TaskOutcome::Fault;
                }

                context.step_count += 1;
            }
            _ => break TaskOutcome::Stopped,
        }
    };

    // The chassis never keeps moving past its task.
    resources.chassis.halt().await;

    match outcome {
        TaskOutcome::Finished => control.set_status(TaskStatus::Finished),
        _ => control.set_status(TaskStatus::Stopped),
    }

    info!("Task ({}) ended: {:?}", phase, outcome);

    outcome
}
