use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};

use crate::config::Config;
use crate::core::detection::LabelHistory;
use crate::core::input::OperatorInput;
use crate::core::mission::MissionPhase;

use super::operand::Operand;
use super::task::{TaskControl, TaskOutcome, TaskResources, TaskState, TaskStatus};

/// Interval between checks of the line follow photo timer.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Operator command surface.
#[derive(Clone, Copy, Debug)]
pub enum MissionCommand {
    /// Start a phase, replacing any running task.
    Start(MissionPhase),
    /// Pause the running task for a clean still frame.
    Pause,
    /// Resume the paused task.
    Resume,
    /// Stop the running task and return to idle.
    Stop,
    /// Manual drive input, honored while idle.
    Input(OperatorInput),
}

/// Mission service.
///
/// Runs the phase chain: fetch the program for the current phase, start the
/// task engine, supervise it until it reports an outcome, then chain to its
/// successor. Inference availability is forwarded to whichever task is
/// active. During line following the service also owns the pause-for-photo
/// timing: motion bursts are cut after the configured duration so the next
/// still frame is taken standing.
pub async fn mission_service<K: Operand>(
    operand: K,
    config: Config,
    resources: TaskResources,
    mut available: broadcast::Receiver<u64>,
    mut commands: mpsc::Receiver<MissionCommand>,
    mut shutdown: broadcast::Receiver<()>,
    history: Arc<Mutex<LabelHistory>>,
) -> super::Result {
    let active: Arc<Mutex<Option<Arc<TaskControl>>>> = Arc::new(Mutex::new(None));

    // Forward availability signals to the active task.
    {
        let active = active.clone();

        tokio::spawn(async move {
            loop {
                match available.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                        let control = active.lock().unwrap().clone();
                        if let Some(control) = control {
                            control.notify_inference_available();
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    let burst = Duration::from_secs_f32(config.mission.line_follow.burst);

    let mut autostart = config.enable_autopilot.then_some(MissionPhase::LineFollow);
    let mut chained: Option<MissionPhase> = None;

    loop {
        let phase = match chained.take() {
            Some(phase) => phase,
            None => {
                let phase = match autostart.take() {
                    Some(phase) => phase,
                    None => {
                        info!("Waiting for operator");

                        loop {
                            tokio::select! {
                                command = commands.recv() => match command {
                                    Some(MissionCommand::Start(phase)) => break phase,
                                    Some(MissionCommand::Input(input)) => {
                                        match operand.try_from_input(input) {
                                            Ok(motion) => resources.chassis.send(motion).await,
                                            Err(()) => warn!("Input not mapped to motion"),
                                        }
                                    }
                                    // Lifecycle commands without a task are no-ops.
                                    Some(_) => {}
                                    None => return Ok(()),
                                },
                                _ = shutdown.recv() => return Ok(()),
                            }
                        }
                    }
                };

                // A fresh mission starts with a clean sighting record.
                history.lock().unwrap().clear();

                phase
            }
        };

        let program = operand.fetch_program(phase);
        let mut handle = TaskState::new(phase, program, resources.clone()).start();

        *active.lock().unwrap() = Some(handle.control());

        let mut photo_tick = tokio::time::interval(PAUSE_POLL_INTERVAL);

        let outcome = loop {
            tokio::select! {
                outcome = &mut handle.join => {
                    break outcome.unwrap_or(TaskOutcome::Fault);
                }
                command = commands.recv() => match command {
                    Some(MissionCommand::Pause) => {
                        if phase == MissionPhase::LineFollow {
                            handle.pause();
                        } else {
                            debug!("Pause ignored outside line follow");
                        }
                    }
                    Some(MissionCommand::Resume) => {
                        if phase == MissionPhase::LineFollow {
                            handle.resume();
                        }
                    }
                    Some(MissionCommand::Stop) => handle.stop(),
                    Some(MissionCommand::Start(next)) => {
                        info!("Replace task ({}) with ({})", phase, next);

                        handle.stop();
                        let _ = (&mut handle.join).await;

                        chained = Some(next);
                        break TaskOutcome::Stopped;
                    }
                    // Manual drive is not honored while a task holds the chassis.
                    Some(MissionCommand::Input(_)) => {}
                    None => {
                        handle.stop();
                        let _ = (&mut handle.join).await;
                        return Ok(());
                    }
                },
                _ = shutdown.recv() => {
                    handle.stop();
                    let _ = (&mut handle.join).await;

                    *active.lock().unwrap() = None;

                    return Ok(());
                }
                _ = photo_tick.tick() => {
                    if phase == MissionPhase::LineFollow
                        && handle.status() == TaskStatus::Running
                        && handle.burst_elapsed() >= burst
                    {
                        handle.pause();
                    }
                }
            }
        };

        *active.lock().unwrap() = None;

        match outcome {
            TaskOutcome::Advance(next) => chained = Some(next),
            TaskOutcome::Finished => info!("Mission finished"),
            TaskOutcome::Stopped => {}
            TaskOutcome::Fault => warn!("Mission halted on task fault"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detection::DetectionSnapshot;
    use crate::core::motion::Motion;
    use crate::core::pose::Odometry;
    use crate::device::{self, LineSensorDevice, SimLineSensor};
    use crate::runtime::motion::Chassis;
    use crate::runtime::program::{Context, Program};
    use std::sync::RwLock;
    use tokio::sync::watch;

    struct StubProgram {
        phase: MissionPhase,
        next: Option<MissionPhase>,
        booted: Arc<Mutex<Vec<MissionPhase>>>,
    }

    #[async_trait::async_trait]
    impl Program for StubProgram {
        async fn boot(&mut self, _context: &mut Context) -> device::Result<()> {
            self.booted.lock().unwrap().push(self.phase);
            Ok(())
        }

        async fn step(&mut self, _context: &mut Context) -> device::Result<()> {
            Ok(())
        }

        fn can_terminate(&self, _context: &Context) -> bool {
            true
        }

        fn successor(&self) -> Option<MissionPhase> {
            self.next
        }
    }

    struct ChainOperand {
        booted: Arc<Mutex<Vec<MissionPhase>>>,
    }

    impl Operand for ChainOperand {
        fn intro(&self) -> String {
            "chain".to_owned()
        }

        fn try_from_input(&self, _input: OperatorInput) -> Result<Motion, ()> {
            Err(())
        }

        fn fetch_program(&self, phase: MissionPhase) -> Box<dyn Program> {
            let next = match phase {
                MissionPhase::LineFollow => Some(MissionPhase::Retrieve),
                _ => None,
            };

            Box::new(StubProgram {
                phase,
                next,
                booted: self.booted.clone(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mission_chains_to_successor() {
        let (motion_tx, mut motion_rx) = tokio::sync::mpsc::channel(1024);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(DetectionSnapshot::default()));
        let (available_tx, available_rx) = broadcast::channel(16);
        let (command_tx, command_rx) = tokio::sync::mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let booted: Arc<Mutex<Vec<MissionPhase>>> = Arc::default();

        let resources = TaskResources {
            chassis: Chassis::new(motion_tx),
            line_sensor: Arc::new(Mutex::new(
                Box::new(SimLineSensor::new()) as Box<dyn LineSensorDevice>
            )),
            odometry: Arc::new(RwLock::new(Odometry::new())),
            snapshot: snapshot_rx,
        };

        let service = tokio::spawn(mission_service(
            ChainOperand {
                booted: booted.clone(),
            },
            Config::default(),
            resources,
            available_rx,
            command_rx,
            shutdown_rx,
            Arc::new(Mutex::new(crate::core::detection::LabelHistory::new())),
        ));

        // Four inference cycles: two per task, with passes in between so the
        // signals do not collapse.
        for seq in 1..=4u64 {
            snapshot_tx
                .send(Arc::new(DetectionSnapshot::new(seq, vec![])))
                .unwrap();
            available_tx.send(seq).unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        assert_eq!(
            *booted.lock().unwrap(),
            vec![MissionPhase::LineFollow, MissionPhase::Retrieve]
        );

        shutdown_tx.send(()).unwrap();
        service.await.unwrap().unwrap();

        // Keep the channel alive until the service is gone.
        drop(command_tx);
        while motion_rx.try_recv().is_ok() {}
    }
}
