pub mod error;

mod camera;
mod linesensor;
mod servo;
mod sim;

pub use camera::Camera;
pub use error::{DeviceError, ErrorKind, Result};
pub use linesensor::GpioLineSensor;
pub use servo::ServoChassis;
pub use sim::{SimChassis, SimLineSensor};

use crate::core::motion::Motion;

/// Surface reading of one reflectance sensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    Light,
    Dark,
}

/// Device that can move the robot.
#[async_trait::async_trait]
pub trait MotionDevice: Send {
    /// Device name for diagnostics.
    fn name(&self) -> String;

    /// Apply a motion instruction.
    ///
    /// Applying a stop instruction must be idempotent.
    async fn actuate(&mut self, motion: Motion) -> Result<()>;
}

/// Device reporting the two floor readings.
pub trait LineSensorDevice: Send {
    /// Device name for diagnostics.
    fn name(&self) -> String;

    /// Read the left and right surface state.
    fn read(&mut self) -> Result<(Surface, Surface)>;
}
