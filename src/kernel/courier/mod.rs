use crate::config::Config;
use crate::core::input::{ButtonState, OperatorInput};
use crate::core::mission::MissionPhase;
use crate::core::motion::Motion;
use crate::runtime::operand::Operand;
use crate::runtime::program::Program;

mod find_crocs;
mod find_door;
mod line_follow;
mod retrieve;

pub use find_crocs::FindCrocs;
pub use find_door::FindDoor;
pub use line_follow::LineFollow;
pub use retrieve::Retrieve;

/// Manual drive speed.
const TELEOP_SPEED: f32 = 1.0;

/// The courier robot.
///
/// Binds the mission programs and the operator controls to the runtime.
#[derive(Clone)]
pub struct Courier {
    config: Config,
}

impl Courier {
    /// Construct operand from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Operand for Courier {
    /// The introduction message makes it easier to spot the current running
    /// configuration.
    fn intro(&self) -> String {
        format!(
            "Hello, I'm a {} 🤖. Got mail to deliver! 📬",
            ansi_term::Color::Cyan.paint("courier")
        )
    }

    /// Try to convert operator input to motion.
    fn try_from_input(&self, input: OperatorInput) -> Result<Motion, ()> {
        match input {
            OperatorInput::DirectionPad(direction) => {
                Ok(Motion::drive(direction, self::TELEOP_SPEED))
            }
            OperatorInput::Brake => Ok(Motion::StopAll),
            OperatorInput::Cancel(ButtonState::Pressed) => Ok(Motion::StopAll),
            OperatorInput::Cancel(ButtonState::Released) => Err(()),
        }
    }

    /// Fetch program by mission phase.
    ///
    /// The factory method returns the courier program for the phase, wired
    /// to the configured thresholds.
    fn fetch_program(&self, phase: MissionPhase) -> Box<dyn Program> {
        let frame_size = self.config.vision.frame_size;

        match phase {
            MissionPhase::LineFollow => {
                Box::new(LineFollow::new(&self.config.mission.line_follow))
            }
            MissionPhase::Retrieve => {
                Box::new(Retrieve::new(&self.config.mission.retrieve, frame_size))
            }
            MissionPhase::FindCrocs => {
                Box::new(FindCrocs::new(&self.config.mission.crocs, frame_size))
            }
            MissionPhase::FindDoor => {
                Box::new(FindDoor::new(&self.config.mission.door, frame_size))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::motion::Direction;

    #[test]
    fn test_teleop_mapping() {
        let operand = Courier::from_config(&Config::default());

        assert_eq!(
            operand.try_from_input(OperatorInput::DirectionPad(Direction::Forward)),
            Ok(Motion::drive(Direction::Forward, 1.0))
        );
        assert_eq!(
            operand.try_from_input(OperatorInput::Brake),
            Ok(Motion::StopAll)
        );
        assert!(operand
            .try_from_input(OperatorInput::Cancel(ButtonState::Released))
            .is_err());
    }

    #[test]
    fn test_every_phase_has_a_program() {
        let operand = Courier::from_config(&Config::default());

        for phase in [
            MissionPhase::LineFollow,
            MissionPhase::Retrieve,
            MissionPhase::FindCrocs,
            MissionPhase::FindDoor,
        ] {
            let _ = operand.fetch_program(phase);
        }
    }
}
