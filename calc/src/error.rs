//! Calculation error types.

use thiserror::Error;

/// Errors produced by the arithmetic and formatting layer.
///
/// The engine's input methods never return these; they are absorbed into
/// the display (the `"Error"` sentinel) or logged.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Display text could not be parsed back into a number.
    #[error("Format error: {0}")]
    Format(String),

    /// Division with a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,

    /// Result is not a finite number.
    #[error("Result out of range")]
    Overflow,

    /// Input rejected by a feature calculator.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for calculation operations.
pub type CalcResult<T> = Result<T, CalcError>;
