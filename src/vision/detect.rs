use std::collections::VecDeque;
use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use crate::core::detection::{Bounds, Detection};
use crate::device::error::{DeviceError, Result};

const DEVICE_NAME: &str = "detector";

/// Object detection backend.
///
/// The network internals are not our concern. A backend takes a frame on
/// disk and reports what it sees; it is allowed to block for as long as the
/// inference takes.
pub trait Detector: Send {
    /// Backend name for diagnostics.
    fn name(&self) -> String;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Path) -> Result<Vec<Detection>>;
}

/// Detection record as printed by the external detector process.
#[derive(Debug, Deserialize)]
struct DetectionRecord {
    label: String,
    confidence: f32,
    #[serde(rename = "box")]
    bounds: [i32; 4],
}

/// Bridge to an external detector process.
///
/// The process is started once per inference cycle with the frame path as
/// its last argument and must print a JSON array of detection records on
/// standard output.
pub struct CommandDetector {
    detect_command: String,
    confidence_margin: f32,
}

impl CommandDetector {
    pub fn new(detect_command: &str, confidence_margin: f32) -> Result<Self> {
        if detect_command.trim().is_empty() {
            return Err(DeviceError::invalid_input(DEVICE_NAME.to_owned()));
        }

        Ok(Self {
            detect_command: detect_command.to_owned(),
            confidence_margin,
        })
    }
}

impl Detector for CommandDetector {
    fn name(&self) -> String {
        DEVICE_NAME.to_owned()
    }

    fn detect(&mut self, frame: &Path) -> Result<Vec<Detection>> {
        let invocation = format!("{} {}", self.detect_command, frame.to_string_lossy());

        let output = Command::new("sh")
            .arg("-c")
            .arg(&invocation)
            .output()
            .map_err(|e| DeviceError::from_io(self.name(), e))?;

        if !output.status.success() {
            return Err(DeviceError::command_failed(
                self.name(),
                output.status.code(),
            ));
        }

        let records: Vec<DetectionRecord> = serde_json::from_slice(&output.stdout)
            .map_err(|_| DeviceError::invalid_input(self.name()))?;

        Ok(records
            .into_iter()
            .filter(|record| record.confidence > self.confidence_margin)
            .map(|record| Detection {
                label: record.label,
                confidence: record.confidence,
                bounds: Bounds::new(
                    record.bounds[0],
                    record.bounds[1],
                    record.bounds[2],
                    record.bounds[3],
                ),
            })
            .collect())
    }
}

/// Detector replaying scripted detection sets.
///
/// Once the script runs out every further cycle reports nothing.
pub struct ReplayDetector {
    script: VecDeque<Vec<Detection>>,
}

impl ReplayDetector {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> String {
        "replay detector".to_owned()
    }

    fn detect(&mut self, _frame: &Path) -> Result<Vec<Detection>> {
        Ok(self.script.pop_front().unwrap_or_default())
    }
}
