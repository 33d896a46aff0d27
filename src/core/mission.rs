use serde::{Deserialize, Serialize};

/// Mission phase.
///
/// The mission advances through the phases in the order listed here. Each
/// phase is executed by its own program until the program reports
/// completion, after which the successor is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPhase {
    /// Follow the floor line until the card is sighted.
    LineFollow,
    /// Drive onto the card.
    Retrieve,
    /// Approach the first landmark.
    FindCrocs,
    /// Approach the door landmark and deliver.
    FindDoor,
}

impl std::fmt::Display for MissionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissionPhase::LineFollow => write!(f, "line follow"),
            MissionPhase::Retrieve => write!(f, "retrieve"),
            MissionPhase::FindCrocs => write!(f, "find crocs"),
            MissionPhase::FindDoor => write!(f, "find door"),
        }
    }
}
