use std::fs;
use std::path::{Path, PathBuf};

use crate::config::LineSensorConfig;

use super::error::{DeviceError, Result};
use super::{LineSensorDevice, Surface};

const DEVICE_NAME: &str = "linesensor";

/// One reflectance sensor on a sysfs GPIO pin.
struct GpioPin {
    value_path: PathBuf,
}

impl GpioPin {
    fn open(root: &Path, pin: u32) -> std::io::Result<Self> {
        let dir = root.join(format!("gpio{}", pin));

        if !dir.exists() {
            fs::write(root.join("export"), pin.to_string())?;
        }

        fs::write(dir.join("direction"), "in")?;

        Ok(Self {
            value_path: dir.join("value"),
        })
    }

    fn read(&self) -> std::io::Result<Surface> {
        let raw = fs::read_to_string(&self.value_path)?;

        Ok(if raw.trim() == "1" {
            Surface::Dark
        } else {
            Surface::Light
        })
    }
}

/// Twin floor reflectance sensor.
pub struct GpioLineSensor {
    left: GpioPin,
    right: GpioPin,
}

impl GpioLineSensor {
    /// Probe the GPIO tree and claim both pins.
    pub fn new(config: &LineSensorConfig) -> Result<Self> {
        if !config.gpio_root.exists() {
            return Err(DeviceError::no_such_device(
                DEVICE_NAME.to_owned(),
                &config.gpio_root,
            ));
        }

        let left = GpioPin::open(&config.gpio_root, config.left_pin)
            .map_err(|e| DeviceError::from_io(DEVICE_NAME.to_owned(), e))?;
        let right = GpioPin::open(&config.gpio_root, config.right_pin)
            .map_err(|e| DeviceError::from_io(DEVICE_NAME.to_owned(), e))?;

        debug!(
            "Line sensor on pins {} and {}",
            config.left_pin, config.right_pin
        );

        Ok(Self { left, right })
    }
}

impl LineSensorDevice for GpioLineSensor {
    fn name(&self) -> String {
        DEVICE_NAME.to_owned()
    }

    fn read(&mut self) -> Result<(Surface, Surface)> {
        let left = self
            .left
            .read()
            .map_err(|e| DeviceError::from_io(self.name(), e))?;
        let right = self
            .right
            .read()
            .map_err(|e| DeviceError::from_io(self.name(), e))?;

        Ok((left, right))
    }
}
