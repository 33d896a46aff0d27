use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ChassisConfig;
use crate::core::motion::Motion;

use super::error::{DeviceError, Result};
use super::MotionDevice;

const DEVICE_NAME: &str = "chassis";

/// PWM period for a 50 Hz servo signal.
const PERIOD_NS: u64 = 20_000_000;
/// Pulse width at standstill.
const PULSE_CENTER_NS: f32 = 1_500_000.0;
/// Pulse width swing at full speed.
const PULSE_RANGE_NS: f32 = 500_000.0;

/// One continuous rotation servo on a sysfs PWM channel.
struct PwmServo {
    duty_path: PathBuf,
}

impl PwmServo {
    fn open(chip: &Path, index: u32) -> std::io::Result<Self> {
        let channel = chip.join(format!("pwm{}", index));

        if !channel.exists() {
            fs::write(chip.join("export"), index.to_string())?;
        }

        fs::write(channel.join("period"), PERIOD_NS.to_string())?;
        fs::write(channel.join("duty_cycle"), "0")?;
        fs::write(channel.join("enable"), "1")?;

        Ok(Self {
            duty_path: channel.join("duty_cycle"),
        })
    }

    /// Set servo speed from the signed unit range.
    fn set_speed(&self, speed: f32) -> std::io::Result<()> {
        let speed = speed.clamp(-1.0, 1.0);

        // Zero duty rather than a centered pulse, stops servo twitch at rest.
        let duty_ns = if speed == 0.0 {
            0
        } else {
            (PULSE_CENTER_NS + PULSE_RANGE_NS * speed) as u64
        };

        fs::write(&self.duty_path, duty_ns.to_string())
    }
}

/// Differential drive chassis on two servo channels.
pub struct ServoChassis {
    left: PwmServo,
    right: PwmServo,
}

impl ServoChassis {
    /// Probe the PWM chip and claim both servo channels.
    pub fn new(config: &ChassisConfig) -> Result<Self> {
        if !config.pwm_chip.exists() {
            return Err(DeviceError::no_such_device(
                DEVICE_NAME.to_owned(),
                &config.pwm_chip,
            ));
        }

        let left = PwmServo::open(&config.pwm_chip, config.left_channel)
            .map_err(|e| DeviceError::from_io(DEVICE_NAME.to_owned(), e))?;
        let right = PwmServo::open(&config.pwm_chip, config.right_channel)
            .map_err(|e| DeviceError::from_io(DEVICE_NAME.to_owned(), e))?;

        debug!(
            "Chassis on {} channels {} and {}",
            config.pwm_chip.to_string_lossy(),
            config.left_channel,
            config.right_channel
        );

        Ok(Self { left, right })
    }
}

#[async_trait::async_trait]
impl MotionDevice for ServoChassis {
    fn name(&self) -> String {
        DEVICE_NAME.to_owned()
    }

    async fn actuate(&mut self, motion: Motion) -> Result<()> {
        let (left, right) = motion.wheel_speeds();

        self.left
            .set_speed(left)
            .map_err(|e| DeviceError::from_io(self.name(), e))?;
        self.right
            .set_speed(right)
            .map_err(|e| DeviceError::from_io(self.name(), e))?;

        Ok(())
    }
}
