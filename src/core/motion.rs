use serde::{Deserialize, Serialize};

/// Drive direction.
///
/// Steering is done by halting one wheel, so a direction is all a motion
/// command carries besides speed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Left,
    Right,
}

/// Motion instruction.
///
/// Whether or not the instruction has positive effect depends on the motion
/// device itself. Speed is normalized to the unit range, the motion device
/// maps it onto its own actuation range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Stop all motion.
    StopAll,
    /// Drive in a direction at the given speed.
    Drive { direction: Direction, speed: f32 },
}

impl Motion {
    /// Construct a drive instruction.
    pub fn drive(direction: Direction, speed: f32) -> Self {
        Motion::Drive { direction, speed }
    }

    /// Whether this instruction leaves the chassis standing still.
    pub fn is_stop(&self) -> bool {
        match self {
            Motion::StopAll => true,
            Motion::Drive { speed, .. } => *speed == 0.0,
        }
    }

    /// Resolve the instruction into a left and right wheel speed.
    ///
    /// A drive at speed zero resolves to the same wheel state as a stop.
    pub fn wheel_speeds(&self) -> (f32, f32) {
        match self {
            Motion::StopAll => (0.0, 0.0),
            Motion::Drive { direction, speed } => match direction {
                Direction::Forward => (*speed, *speed),
                Direction::Left => (0.0, *speed),
                Direction::Right => (*speed, 0.0),
            },
        }
    }
}

impl std::fmt::Display for Motion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Motion::StopAll => write!(f, "Stop all"),
            Motion::Drive { direction, speed } => {
                write!(f, "Drive: {:?}; Speed: {:.2}", direction, speed)
            }
        }
    }
}
