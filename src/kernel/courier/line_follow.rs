use crate::config::LineFollowConfig;
use crate::core::mission::MissionPhase;
use crate::core::motion::Direction;
use crate::device::{self, Surface};
use crate::runtime::program::{Context, Program};

/// Follow the floor line until the card comes into view.
///
/// The line sensors are read on every pass, line corrections are not gated
/// on inference. The orchestrator cuts each motion burst after a configured
/// duration so a still frame can be taken standing.
pub struct LineFollow {
    config: LineFollowConfig,
    /// Odometry credit armed once per motion burst.
    advance_pending: bool,
}

impl LineFollow {
    pub fn new(config: &LineFollowConfig) -> Self {
        Self {
            config: config.clone(),
            advance_pending: true,
        }
    }
}

#[async_trait::async_trait]
impl Program for LineFollow {
    async fn step(&mut self, context: &mut Context) -> device::Result<()> {
        if self.advance_pending {
            self.advance_pending = false;
            context.advance_position(self.config.advance);
        }

        let (left, right) = context.read_line_sensors()?;

        if left == right {
            context
                .chassis()
                .drive(Direction::Forward, self.config.speed)
                .await;
        } else if left == Surface::Light {
            context
                .chassis()
                .drive(Direction::Left, self.config.speed)
                .await;
        } else {
            context
                .chassis()
                .drive(Direction::Right, self.config.speed)
                .await;
        }

        Ok(())
    }

    fn can_terminate(&self, context: &Context) -> bool {
        context.snapshot.contains(&self.config.target)
    }

    fn on_resume(&mut self) {
        self.advance_pending = true;
    }

    fn successor(&self) -> Option<MissionPhase> {
        Some(MissionPhase::Retrieve)
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

    fn test_context(
        sensor: SimLineSensor,
    ) -> (Context, mpsc::Receiver<Motion>, Arc<RwLock<Odometry>>) {
        let (motion_tx, motion_rx) = mpsc::channel(64);
        let odometry = Arc::new(RwLock::new(Odometry::new()));

        let context = Context::new(
            Chassis::new(motion_tx),
            Arc::new(Mutex::new(Box::new(sensor) as Box<dyn LineSensorDevice>)),
            odometry.clone(),
            Arc::new(DetectionSnapshot::default()),
        );

        (context, motion_rx, odometry)
    }

    #[tokio::test]
    async fn test_sensor_truth_table() {
        let cases = [
            ((Surface::Light, Surface::Light), Direction::Forward),
            ((Surface::Light, Surface::Dark), Direction::Left),
            ((Surface::Dark, Surface::Light), Direction::Right),
            ((Surface::Dark, Surface::Dark), Direction::Forward),
        ];

        // Each case must hold regardless of the readings that came before,
        // so run every case against every prior state.
        for (prior, _) in cases {
            for (reading, expected) in cases {
                let sensor = SimLineSensor::with_script(&[prior, reading]);
                let (mut context, mut motion_rx, _) = test_context(sensor);
                let mut program = LineFollow::new(&LineFollowConfig::default());

                program.step(&mut context).await.unwrap();
                program.step(&mut context).await.unwrap();

                let _first = motion_rx.try_recv().unwrap();
                let second = motion_rx.try_recv().unwrap();

                assert_eq!(second, Motion::drive(expected, 0.5));
            }
        }
    }

    #[tokio::test]
    async fn test_position_credited_once_per_burst() {
        let sensor = SimLineSensor::new();
        let (mut context, _motion_rx, odometry) = test_context(sensor);
        let mut program = LineFollow::new(&LineFollowConfig::default());

        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();

        assert!((odometry.read().unwrap().position() - 1.5).abs() < f32::EPSILON);

        // A resume arms exactly one more credit.
        program.on_resume();
        program.step(&mut context).await.unwrap();
        program.step(&mut context).await.unwrap();

        assert!((odometry.read().unwrap().position() - 3.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_completes_on_target_sighting() {
        let sensor = SimLineSensor::new();
        let (mut context, _motion_rx, _) = test_context(sensor);
        let program = LineFollow::new(&LineFollowConfig::default());

        assert!(!program.can_terminate(&context));

        context.snapshot = Arc::new(DetectionSnapshot::new(
            1,
            vec![Detection {
                label: "studentid".to_owned(),
                confidence: 0.7,
                bounds: Bounds::new(80, 80, 220, 220),
            }],
        ));

        assert!(program.can_terminate(&context));
        assert_eq!(program.successor(), Some(MissionPhase::Retrieve));
    }
}
