use std::time::Duration;

use crate::config::DoorConfig;
use crate::core::motion::Direction;
use crate::device;
use crate::runtime::program::{Context, Program};

/// Approach the landmark next to the door and deliver the card.
///
/// Starts with a fixed orienting turn away from the previous landmark. The
/// landmark width doubles as a range measurement, so every reliable sighting
/// also overwrites the accurate position estimate. Completion triggers the
/// delivery maneuver and ends the mission.
pub struct FindDoor {
    config: DoorConfig,
    frame_size: i32,
    /// A decision already ran this inference cycle.
    acted: bool,
}

impl FindDoor {
    pub fn new(config: &DoorConfig, frame_size: i32) -> Self {
        Self {
            config: config.clone(),
            frame_size,
            acted: false,
        }
    }
}

#[async_trait::async_trait]
impl Program for FindDoor {
    async fn boot(&mut self, context: &mut Context) -> device::Result<()> {
        // Orient toward the door side before the first frame.
        context
            .chassis()
            .pulse(
                Direction::Right,
                Duration::from_secs_f32(self.config.orient_pulse),
            )
            .await;
        context.chassis().halt().await;

        Ok(())
    }

    async fn step(&mut self, context: &mut Context) -> device::Result<()> {
        let landmark = context
            .snapshot
            .find(&self.config.target)
            .map(|detection| detection.bounds);

        if let Some(bounds) = landmark {
            if !self.acted {
                self.acted = true;

                context.fix_position(bounds.width());

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
                }
            }
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

    async fn term_action(&mut self, context: &mut Context) -> device::Result<()> {
        // Swing toward the door gap and push the card under.
        context
            .chassis()
            .pulse(
                Direction::Left,
                Duration::from_secs_f32(self.config.deliver_turn),
            )
            .await;
        context
            .chassis()
            .pulse(
                Direction::Forward,
                Duration::from_secs_f32(self.config.deliver_pulse),
            )
            .await;
        context.chassis().halt().await;

        Ok(())
    }

    fn on_inference(&mut self) {
        self.acted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::detection::{Bounds, Detection, DetectionSnapshot};
    use crate::core::motion::Motion;
    use crate::core::pose::Odometry;
    use crate::device::{LineSensorDevice, SimLineSensor};
    use crate::runtime::motion::Chassis;
    use std::sync::{Arc, Mutex, RwLock};
    use tokio::sync::mpsc;

    fn test_context() -> (Context, mpsc::Receiver<Motion>, Arc<RwLock<Odometry>>) {
        let (motion_tx, motion_rx) = mpsc::channel(256);
        let odometry = Arc::new(RwLock::new(Odometry::new()));

        let context = Context::new(
            Chassis::new(motion_tx),
            Arc::new(Mutex::new(
                Box::new(SimLineSensor::new()) as Box<dyn LineSensorDevice>
            )),
            odometry.clone(),
            Arc::new(DetectionSnapshot::default()),
        );

        (context, motion_rx, odometry)
    }

    fn pods_snapshot(seq: u64, width: i32) -> Arc<DetectionSnapshot> {
        let x0 = (300 - width) / 2;

        Arc::new(DetectionSnapshot::new(
            seq,
            vec![Detection {
                label: "tidepods".to_owned(),
                confidence: 0.9,
                bounds: Bounds::new(x0, 40, x0 + width, 40 + width),
            }],
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_boot_orients_right() {
        let (mut context, mut motion_rx, _) = test_context();
        let mut program = FindDoor::new(&DoorConfig::default(), 300);

        program.boot(&mut context).await.unwrap();

        assert_eq!(
            motion_rx.try_recv().unwrap(),
            Motion::drive(Direction::Right, 1.0)
        );
        assert_eq!(motion_rx.try_recv().unwrap(), Motion::StopAll);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sighting_overwrites_accurate_position() {
        let (mut context, _motion_rx, odometry) = test_context();
        let mut program = FindDoor::new(&DoorConfig::default(), 300);

        program.on_inference();
        context.snapshot = pods_snapshot(1, 100);
        program.step(&mut context).await.unwrap();

        let far = odometry.read().unwrap().accurate_position();

        program.on_inference();
        context.snapshot = pods_snapshot(2, 180);
        program.step(&mut context).await.unwrap();

        let near = odometry.read().unwrap().accurate_position();

        assert!(far > 0.0);
        assert!(near < far);
    }

    #[tokio::test(start_paused = true)]
    async fn test_acts_once_per_cycle() {
        let (mut context, mut motion_rx, _) = test_context();
        let mut program = FindDoor::new(&DoorConfig::default(), 300);

        program.on_inference();
        context.snapshot = pods_snapshot(1, 100);

        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();

        let mut drives = 0;
        while let Ok(motion) = motion_rx.try_recv() {
            if let Motion::Drive { .. } = motion {
                drives += 1;
            }
        }

        // One approach pulse across three passes of the same cycle.
        assert_eq!(drives, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_term_action_delivers() {
        let (mut context, mut motion_rx, _) = test_context();
        let mut program = FindDoor::new(&DoorConfig::default(), 300);

        program.term_action(&mut context).await.unwrap();

        assert_eq!(
            motion_rx.try_recv().unwrap(),
            Motion::drive(Direction::Left, 1.0)
        );
        assert_eq!(
            motion_rx.try_recv().unwrap(),
            Motion::drive(Direction::Forward, 1.0)
        );
        assert_eq!(motion_rx.try_recv().unwrap(), Motion::StopAll);
    }

    #[tokio::test]
    async fn test_terminal_program_has_no_successor() {
        let (mut context, _motion_rx, _) = test_context();
        let program = FindDoor::new(&DoorConfig::default(), 300);

        context.snapshot = pods_snapshot(1, 205);
        assert!(program.can_terminate(&context));
        assert_eq!(program.successor(), None);

        context.snapshot = pods_snapshot(2, 200);
        assert!(!program.can_terminate(&context));
    }
}
