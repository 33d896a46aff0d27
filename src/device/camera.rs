use std::path::PathBuf;
use std::process::Command;

use super::error::{DeviceError, Result};

/// Still frame camera driven by an external capture command.
///
/// The capture mechanics are not our concern, any command that writes an
/// image to the path appended to its argument list will do.
pub struct Camera {
    name: String,
    capture_command: String,
    output: PathBuf,
}

impl Camera {
    pub fn new(name: &str, capture_command: &str, output: PathBuf) -> Result<Self> {
        if capture_command.trim().is_empty() {
            return Err(DeviceError::invalid_input(name.to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
            capture_command: capture_command.to_owned(),
            output,
        })
    }

    /// Run the camera setup commands.
    ///
    /// Failures are logged and skipped, a camera that needs no setup is the
    /// common case.
    pub fn initialize(&self, setup_commands: &[String]) {
        for command in setup_commands {
            debug!("Camera setup: {}", command);

            match Command::new("sh").arg("-c").arg(command).status() {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("Camera setup exited with {}", status),
                Err(e) => warn!("Camera setup failed: {}", e),
            }
        }
    }

    /// Capture one frame.
    ///
    /// The capture command blocks on a worker thread and is joined before
    /// the frame path is returned.
    pub async fn capture(&self) -> Result<PathBuf> {
        let name = self.name.clone();
        let output = self.output.clone();
        let invocation = format!("{} {}", self.capture_command, output.to_string_lossy());

        trace!("Capture frame: {}", invocation);

        let status = tokio::task::spawn_blocking(move || {
            Command::new("sh").arg("-c").arg(&invocation).status()
        })
        .await
        .map_err(|_| DeviceError::invalid_input(name.clone()))?
        .map_err(|e| DeviceError::from_io(name.clone(), e))?;

        if status.success() {
            Ok(output)
        } else {
            Err(DeviceError::command_failed(name, status.code()))
        }
    }
}
