use std::time::Duration;

use crate::config::LandmarkConfig;
use crate::core::detection::Bounds;
use crate::core::mission::MissionPhase;
use crate::core::motion::Direction;
use crate::device;
use crate::runtime::program::{Context, Program};

/// Locate the first landmark and drive up to it.
///
/// The landmark's apparent width stands in for distance: the task is done
/// once the bounding box is wide enough. When the landmark is out of view an
/// intermediate marker, visible from the start position, triggers a fixed
/// turn-and-advance maneuver; with neither in view the robot scans in place.
/// The large fixed maneuvers run at most once per inference cycle so their
/// effect is confirmed by a fresh frame before they repeat.
pub struct FindCrocs {
    config: LandmarkConfig,
    frame_size: i32,
    last_bounds: Option<Bounds>,
    /// A blind maneuver already ran this inference cycle.
    acted: bool,
}

impl FindCrocs {
    pub fn new(config: &LandmarkConfig, frame_size: i32) -> Self {
        Self {
            config: config.clone(),
            frame_size,
            last_bounds: None,
            acted: false,
        }
    }
}

#[async_trait::async_trait]
impl Program for FindCrocs {
    async fn step(&mut self, context: &mut Context) -> device::Result<()> {
        let previous = self.last_bounds;

        self.last_bounds = context
            .snapshot
            .find(&self.config.target)
            .map(|detection| detection.bounds);

        let marker_visible = context.snapshot.contains(&self.config.marker);

        if let Some(bounds) = self.last_bounds {
            if previous != self.last_bounds {
                let offset = bounds.center_offset(self.frame_size);
                let dead_band = (self.frame_size as f32 * self.config.dead_band) as i32;

                if offset < -dead_band {
                    context
                        .chassis()
                        .pulse(
                            Direction::Left,
                            Duration::from_secs_f32(self.config.turn_pulse),
                        )
                        .await;
                } else if offset > dead_band {
                    context
                        .chassis()
                        .pulse(
                            Direction::Right,
                            Duration::from_secs_f32(self.config.turn_pulse),
                        )
                        .await;
                } else if bounds.width() < self.config.target_width {
                    context
                        .chassis()
                        .pulse(
                            Direction::Forward,
                            Duration::from_secs_f32(self.config.approach_pulse),
                        )
                        .await;
                    context.advance_position(self.config.approach_advance);
                }
            }
        } else if marker_visible && !self.acted {
            // Turn away from the marker and close most of the distance in
            // one blind move.
            self.acted = true;

            context
                .chassis()
                .pulse(
                    Direction::Right,
                    Duration::from_secs_f32(self.config.marker_turn),
                )
                .await;
            context
                .chassis()
                .pulse(
                    Direction::Forward,
                    Duration::from_secs_f32(self.config.marker_pulse),
                )
                .await;
            context.advance_position(self.config.marker_advance);
        } else if !self.acted {
            self.acted = true;

            context
                .chassis()
                .pulse(
                    Direction::Right,
                    Duration::from_secs_f32(self.config.scan_pulse),
                )
                .await;
        }

        context.chassis().halt().await;

        Ok(())
    }

    fn can_terminate(&self, context: &Context) -> bool {
        context
            .snapshot
            .find(&self.config.target)
            .map_or(false, |detection| {
                detection.bounds.width() > self.config.target_width
            })
    }

    fn on_inference(&mut self) {
        self.acted = false;
    }

    fn successor(&self) -> Option<MissionPhase> {
        Some(MissionPhase::FindDoor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detection::{Detection, DetectionSnapshot};
    use crate::core::motion::Motion;
    use crate::core::pose::Odometry;
    use crate::device::{LineSensorDevice, SimLineSensor};
    use crate::runtime::motion::Chassis;
    use crate::runtime::task::{TaskOutcome, TaskResources, TaskState, TaskStatus};
    use std::sync::{Arc, Mutex, RwLock};
    use tokio::sync::{mpsc, watch};

    fn test_context() -> (Context, mpsc::Receiver<Motion>) {
        let (motion_tx, motion_rx) = mpsc::channel(256);

        let context = Context::new(
            Chassis::new(motion_tx),
            Arc::new(Mutex::new(
                Box::new(SimLineSensor::new()) as Box<dyn LineSensorDevice>
            )),
            Arc::new(RwLock::new(Odometry::new())),
            Arc::new(DetectionSnapshot::default()),
        );

        (context, motion_rx)
    }

    fn crocs_snapshot(seq: u64, width: i32) -> Arc<DetectionSnapshot> {
        // Centered box of the given width.
        let x0 = (300 - width) / 2;

        Arc::new(DetectionSnapshot::new(
            seq,
            vec![Detection {
                label: "crocs".to_owned(),
                confidence: 0.85,
                bounds: Bounds::new(x0, 50, x0 + width, 50 + width),
            }],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_exactly_at_target_width() {
        let (motion_tx, mut motion_rx) = mpsc::channel(4096);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(DetectionSnapshot::default()));

        let resources = TaskResources {
            chassis: Chassis::new(motion_tx),
            line_sensor: Arc::new(Mutex::new(
                Box::new(SimLineSensor::new()) as Box<dyn LineSensorDevice>
            )),
            odometry: Arc::new(RwLock::new(Odometry::new())),
            snapshot: snapshot_rx,
        };

        let program = FindCrocs::new(&LandmarkConfig::default(), 300);
        let handle = TaskState::new(MissionPhase::FindCrocs, Box::new(program), resources).start();

        // The landmark grows cycle over cycle; the threshold is 170 so only
        // the last cycle may complete the task.
        for (cycle, width) in [50, 90, 130, 175].into_iter().enumerate() {
            snapshot_tx
                .send(crocs_snapshot(cycle as u64 + 1, width))
                .unwrap();
            handle.notify_inference_available();

            // Leave room for the approach pulse so cycles do not collapse.
            tokio::time::sleep(Duration::from_secs(5)).await;
            while motion_rx.try_recv().is_ok() {}

            if width <= 170 {
                assert_eq!(handle.status(), TaskStatus::Running);
            }
        }

        let outcome = handle.join.await.unwrap();
        assert_eq!(outcome, TaskOutcome::Advance(MissionPhase::FindDoor));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_fires_once_per_cycle() {
        let (mut context, mut motion_rx) = test_context();
        let mut program = FindCrocs::new(&LandmarkConfig::default(), 300);

        // Five empty inference cycles, several poll passes each.
        let mut scans = 0;
        for seq in 1..=5u64 {
            program.on_inference();
            context.snapshot = Arc::new(DetectionSnapshot::new(seq, vec![]));

            for _ in 0..4 {
                program.step(&mut context).await.unwrap();
            }

            while let Ok(motion) = motion_rx.try_recv() {
                if let Motion::Drive { .. } = motion {
                    scans += 1;
                }
            }
        }

        assert_eq!(scans, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_marker_maneuver_runs_once() {
        let (mut context, mut motion_rx) = test_context();
        let mut program = FindCrocs::new(&LandmarkConfig::default(), 300);

        program.on_inference();
        context.snapshot = Arc::new(DetectionSnapshot::new(
            1,
            vec![Detection {
                label: "skateboard".to_owned(),
                confidence: 0.8,
                bounds: Bounds::new(100, 100, 200, 200),
            }],
        ));

        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();

        let drives: Vec<Motion> = {
            let mut drives = vec![];
            while let Ok(motion) = motion_rx.try_recv() {
                if let Motion::Drive { .. } = motion {
                    drives.push(motion);
                }
            }
            drives
        };

        // One turn and one advance, not repeated on the second pass.
        assert_eq!(
            drives,
            vec![
                Motion::drive(Direction::Right, 1.0),
                Motion::drive(Direction::Forward, 1.0),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_off_center_landmark_steers_toward_it() {
        let (mut context, mut motion_rx) = test_context();
        let mut program = FindCrocs::new(&LandmarkConfig::default(), 300);

        // Box fully in the left third: offset far below the dead band.
        context.snapshot = Arc::new(DetectionSnapshot::new(
            1,
            vec![Detection {
                label: "crocs".to_owned(),
                confidence: 0.85,
                bounds: Bounds::new(0, 50, 60, 110),
            }],
        ));

        program.step(&mut context).await.unwrap();

        assert_eq!(
            motion_rx.try_recv().unwrap(),
            Motion::drive(Direction::Left, 1.0)
        );
    }
}
