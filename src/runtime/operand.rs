use crate::core::input::OperatorInput;
use crate::core::mission::MissionPhase;
use crate::core::motion::Motion;

use super::program::Program;

/// The operand binds a concrete robot to the generic runtime.
///
/// It maps operator input onto motion and hands out the program for each
/// mission phase.
pub trait Operand: Send + Sync {
    /// The introduction message makes it easier to spot the current running
    /// configuration.
    fn intro(&self) -> String;

    /// Try convert operator input to motion.
    fn try_from_input(&self, input: OperatorInput) -> std::result::Result<Motion, ()>;

    /// Fetch program by mission phase.
    ///
    /// The factory method returns a program ready to be spawned by the task
    /// engine.
    fn fetch_program(&self, phase: MissionPhase) -> Box<dyn Program>;
}
