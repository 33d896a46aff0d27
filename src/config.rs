use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Courier global configuration.
///
/// The configuration is read from a TOML file, any missing field falls back
/// to its default. Every motion threshold the mission programs act on lives
/// here rather than in the programs themselves.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the binary.
    #[serde(skip)]
    pub bin_name: String,

    /// Whether the application runs as daemon.
    pub daemon: bool,

    /// Whether motion is enabled.
    pub enable_motion: bool,

    /// Whether motion is slowed down.
    pub slow_motion: bool,

    /// Whether the mission starts without operator interaction.
    pub enable_autopilot: bool,

    /// Runtime validation mode, probe and exit.
    #[serde(skip)]
    pub enable_test: bool,

    /// Number of runtime workers.
    pub runtime_workers: usize,

    /// Workspace directory.
    pub workspace: PathBuf,

    /// Drive chassis configuration.
    pub chassis: ChassisConfig,

    /// Line sensor configuration.
    pub line_sensor: LineSensorConfig,

    /// Camera and detector configuration.
    pub vision: VisionConfig,

    /// Mission program configuration.
    pub mission: MissionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bin_name: String::new(),
            daemon: false,
            enable_motion: true,
            slow_motion: false,
            enable_autopilot: true,
            enable_test: false,
            runtime_workers: 4,
            workspace: PathBuf::from("/var/lib/courier"),
            chassis: ChassisConfig::default(),
            line_sensor: LineSensorConfig::default(),
            vision: VisionConfig::default(),
            mission: MissionConfig::default(),
        }
    }
}

impl Config {
    /// Try to read the configuration from the first file that exists.
    ///
    /// Returns the default configuration when none of the locations exist.
    pub fn try_from_file<T: AsRef<Path>>(locations: Vec<T>) -> anyhow::Result<Self> {
        for location in locations {
            let location = location.as_ref();
            if location.is_file() {
                let contents = std::fs::read_to_string(location)?;
                let config = toml::from_str(&contents)?;
                return Ok(config);
            }
        }

        Ok(Self::default())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Motion enabled: {}", self.enable_motion)?;
        writeln!(f, "  Slow motion: {}", self.slow_motion)?;
        writeln!(f, "  Autopilot enabled: {}", self.enable_autopilot)?;
        writeln!(f, "  Runtime workers: {}", self.runtime_workers)?;
        writeln!(f, "  Workspace: {}", self.workspace.to_string_lossy())?;
        writeln!(f, "  PWM chip: {}", self.chassis.pwm_chip.to_string_lossy())?;
        write!(f, "  Frame size: {}", self.vision.frame_size)
    }
}

/// Differential drive chassis, two continuous rotation servos.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    /// Sysfs PWM chip directory.
    pub pwm_chip: PathBuf,
    /// PWM channel of the left servo.
    pub left_channel: u32,
    /// PWM channel of the right servo.
    pub right_channel: u32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self {
            pwm_chip: PathBuf::from("/sys/class/pwm/pwmchip0"),
            left_channel: 0,
            right_channel: 1,
        }
    }
}

/// Twin reflectance sensor pointed at the floor.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LineSensorConfig {
    /// Sysfs GPIO root directory.
    pub gpio_root: PathBuf,
    /// GPIO pin of the left sensor.
    pub left_pin: u32,
    /// GPIO pin of the right sensor.
    pub right_pin: u32,
}

impl Default for LineSensorConfig {
    fn default() -> Self {
        Self {
            gpio_root: PathBuf::from("/sys/class/gpio"),
            left_pin: 22,
            right_pin: 23,
        }
    }
}

/// Still camera, live camera and detector backend.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Command capturing a still frame, output path is appended.
    pub capture_command: String,
    /// Command capturing a live view frame, output path is appended.
    pub live_command: String,
    /// Command running detection on a frame, frame path is appended.
    ///
    /// The command must print one JSON array of detection records on
    /// standard output.
    pub detect_command: String,
    /// Commands run once before the first capture.
    pub camera_setup: Vec<String>,
    /// Detections below this confidence are discarded.
    pub confidence_margin: f32,
    /// Side length of the square detection frame in pixels.
    pub frame_size: i32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            capture_command: "fswebcam -S 20 -d /dev/video0".to_owned(),
            live_command: "libcamera-still -n --immediate -o".to_owned(),
            detect_command: "courier-detect".to_owned(),
            camera_setup: vec![],
            confidence_margin: 0.2,
            frame_size: 300,
        }
    }
}

/// Mission program configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    pub line_follow: LineFollowConfig,
    pub retrieve: RetrieveConfig,
    pub crocs: LandmarkConfig,
    pub door: DoorConfig,
}

/// Line following, phase one.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LineFollowConfig {
    /// Label ending the line follow phase when it appears.
    pub target: String,
    /// Drive speed while following the line.
    pub speed: f32,
    /// Odometry pulses credited per motion burst.
    pub advance: f32,
    /// Seconds of motion before the robot pauses for a still frame.
    pub burst: f32,
}

impl Default for LineFollowConfig {
    fn default() -> Self {
        Self {
            target: "studentid".to_owned(),
            speed: 0.5,
            advance: 1.5,
            burst: 2.5,
        }
    }
}

/// Card retrieval, phase two.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrieveConfig {
    /// Label of the card to drive onto.
    pub target: String,
    /// Steering dead band as a fraction of the frame width.
    pub dead_band: f32,
    /// Seconds of a steering pulse.
    pub turn_pulse: f32,
    /// Seconds of a forward pulse.
    pub forward_pulse: f32,
    /// Odometry pulses credited per forward pulse.
    pub advance: f32,
}

impl Default for RetrieveConfig {
    fn default() -> Self {
        Self {
            target: "studentid".to_owned(),
            dead_band: 0.25,
            turn_pulse: 0.1,
            forward_pulse: 1.0,
            advance: 1.0,
        }
    }
}

/// First landmark approach, phase three.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LandmarkConfig {
    /// Label of the landmark to approach.
    pub target: String,
    /// Label of the intermediate marker seen from the start position.
    pub marker: String,
    /// Bounding box width at which the landmark counts as reached.
    pub target_width: i32,
    /// Steering dead band as a fraction of the frame width.
    pub dead_band: f32,
    /// Seconds of a steering pulse.
    pub turn_pulse: f32,
    /// Seconds of an approach pulse.
    pub approach_pulse: f32,
    /// Odometry pulses credited per approach pulse.
    pub approach_advance: f32,
    /// Seconds of the turn away from the marker.
    pub marker_turn: f32,
    /// Seconds of the advance after the marker turn.
    pub marker_pulse: f32,
    /// Odometry pulses credited for the marker maneuver.
    pub marker_advance: f32,
    /// Seconds of a scanning turn when nothing is visible.
    pub scan_pulse: f32,
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            target: "crocs".to_owned(),
            marker: "skateboard".to_owned(),
            target_width: 170,
            dead_band: 0.3,
            turn_pulse: 0.15,
            approach_pulse: 2.0,
            approach_advance: 2.0,
            marker_turn: 3.5,
            marker_pulse: 4.0,
            marker_advance: 4.0,
            scan_pulse: 0.3,
        }
    }
}

/// Second landmark approach and delivery, phase four.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DoorConfig {
    /// Label of the landmark next to the door.
    pub target: String,
    /// Bounding box width at which the landmark counts as reached.
    pub target_width: i32,
    /// Steering dead band as a fraction of the frame width.
    pub dead_band: f32,
    /// Seconds of a steering pulse.
    pub turn_pulse: f32,
    /// Seconds of an approach pulse.
    pub approach_pulse: f32,
    /// Seconds of the orienting turn on activation.
    pub orient_pulse: f32,
    /// Seconds of a scanning turn when the landmark is not visible.
    pub scan_pulse: f32,
    /// Seconds of the delivery turn.
    pub deliver_turn: f32,
    /// Seconds of the delivery advance.
    pub deliver_pulse: f32,
}

impl Default for DoorConfig {
    fn default() -> Self {
        Self {
            target: "tidepods".to_owned(),
            target_width: 200,
            dead_band: 0.3,
            turn_pulse: 0.1,
            approach_pulse: 2.0,
            orient_pulse: 0.5,
            scan_pulse: 0.3,
            deliver_turn: 1.5,
            deliver_pulse: 6.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert!(config.enable_motion);
        assert!(config.enable_autopilot);
        assert_eq!(config.vision.frame_size, 300);
        assert_eq!(config.mission.crocs.target_width, 170);
        assert_eq!(config.mission.door.target_width, 200);
        assert_eq!(config.mission.retrieve.dead_band, 0.25);
    }

    #[test]
    fn test_config_partial_file() {
        let config: Config = toml::from_str(
            r#"
            enable_autopilot = false

            [mission.crocs]
            target_width = 185

            [vision]
            frame_size = 320
            "#,
        )
        .unwrap();

        assert!(!config.enable_autopilot);
        assert!(config.enable_motion);
        assert_eq!(config.mission.crocs.target_width, 185);
        assert_eq!(config.mission.crocs.dead_band, 0.3);
        assert_eq!(config.vision.frame_size, 320);
        assert_eq!(config.mission.line_follow.target, "studentid");
    }
}
