use crate::core::motion::Direction;

/// Button state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    /// Button pressed.
    Pressed,
    /// Button released.
    Released,
}

/// Operator input scancode.
///
/// Scancodes are indirectly mapped to operator controls. Any console can
/// emit these codes, their effect is left to the operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatorInput {
    /// Direction pad, manual drive.
    DirectionPad(Direction),
    /// Brake, manual stop.
    Brake,
    /// Cancel button.
    Cancel(ButtonState),
}
