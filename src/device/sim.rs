use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::motion::Motion;

use super::error::Result;
use super::{LineSensorDevice, MotionDevice, Surface};

#[derive(Default)]
struct SimState {
    wheels: (f32, f32),
    history: Vec<Motion>,
}

/// Simulated chassis recording every instruction it receives.
///
/// Clones share state, keep one clone around to inspect the chassis after
/// the device itself moved into the runtime.
#[derive(Clone, Default)]
pub struct SimChassis {
    state: Arc<Mutex<SimState>>,
}

impl SimChassis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current wheel speeds.
    pub fn wheels(&self) -> (f32, f32) {
        self.state.lock().unwrap().wheels
    }

    /// Every instruction received so far.
    pub fn history(&self) -> Vec<Motion> {
        self.state.lock().unwrap().history.clone()
    }
}

#[async_trait::async_trait]
impl MotionDevice for SimChassis {
    fn name(&self) -> String {
        "sim chassis".to_owned()
    }

    async fn actuate(&mut self, motion: Motion) -> Result<()> {
        let mut state = self.state.lock().unwrap();

        state.wheels = motion.wheel_speeds();
        state.history.push(motion);

        Ok(())
    }
}

/// Simulated line sensor replaying a scripted sequence.
///
/// Once the script runs out the last reading repeats forever.
pub struct SimLineSensor {
    script: VecDeque<(Surface, Surface)>,
    last: (Surface, Surface),
}

impl SimLineSensor {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            last: (Surface::Light, Surface::Light),
        }
    }

    pub fn with_script(readings: &[(Surface, Surface)]) -> Self {
        let mut sensor = Self::new();
        sensor.script.extend(readings.iter().copied());
        sensor
    }
}

impl Default for SimLineSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSensorDevice for SimLineSensor {
    fn name(&self) -> String {
        "sim linesensor".to_owned()
    }

    fn read(&mut self) -> Result<(Surface, Surface)> {
        if let Some(reading) = self.script.pop_front() {
            self.last = reading;
        }

        Ok(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motion::Direction;

    #[tokio::test]
    async fn test_stop_equals_zero_speed_drive() {
        for direction in [Direction::Forward, Direction::Left, Direction::Right] {
            let mut stopped = SimChassis::new();
            let mut zeroed = SimChassis::new();

            stopped.actuate(Motion::StopAll).await.unwrap();
            zeroed
                .actuate(Motion::drive(direction, 0.0))
                .await
                .unwrap();

            assert_eq!(stopped.wheels(), zeroed.wheels());
        }
    }

    #[tokio::test]
    async fn test_history_records_in_order() {
        let mut chassis = SimChassis::new();
        let probe = chassis.clone();

        chassis
            .actuate(Motion::drive(Direction::Forward, 0.5))
            .await
            .unwrap();
        chassis.actuate(Motion::StopAll).await.unwrap();

        assert_eq!(
            probe.history(),
            vec![Motion::drive(Direction::Forward, 0.5), Motion::StopAll]
        );
        assert_eq!(probe.wheels(), (0.0, 0.0));
    }

    #[test]
    fn test_line_sensor_script_repeats_last() {
        let mut sensor =
            SimLineSensor::with_script(&[(Surface::Light, Surface::Dark), (Surface::Dark, Surface::Dark)]);

        assert_eq!(sensor.read().unwrap(), (Surface::Light, Surface::Dark));
        assert_eq!(sensor.read().unwrap(), (Surface::Dark, Surface::Dark));
        assert_eq!(sensor.read().unwrap(), (Surface::Dark, Surface::Dark));
    }
}
