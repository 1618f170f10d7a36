//! Formula error types

use tally_sheets_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// Parse-time variants never reach the host: the engine turns them into an
/// `#ERROR!` literal in the AST. Evaluation-time variants unwind to the
/// engine, which displays [`FormulaError::cell_error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Unrecognized character in formula text
    #[error("Unrecognized character '{ch}' at position {position}")]
    Lex { ch: char, position: usize },

    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// An error literal was evaluated
    #[error("Error literal {0}")]
    Literal(CellError),

    /// A cell's resolution required itself
    #[error("Circular reference through {0}")]
    CircularReference(String),

    /// Cell name does not match the cell-name grammar
    #[error("Invalid cell name: {0}")]
    InvalidName(String),

    /// Reference outside the grid
    #[error("Reference out of bounds: {0}")]
    OutOfBounds(String),

    /// Division by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Zero raised to the zero power
    #[error("Zero raised to the zero power")]
    ZeroToZeroPower,

    /// Result not representable as a finite number
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    /// Function name outside the built-in set
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Dependency chain or nesting deeper than the configured bound
    #[error("Evaluation exceeded maximum depth of {0}")]
    DepthExceeded(usize),
}

impl FormulaError {
    /// The error code a cell displays for this failure
    pub fn cell_error(&self) -> CellError {
        match self {
            FormulaError::Lex { .. } | FormulaError::Parse(_) => CellError::Generic,
            FormulaError::Literal(code) => *code,
            FormulaError::CircularReference(_) => CellError::Circular,
            FormulaError::InvalidName(_) | FormulaError::UnknownFunction(_) => CellError::Name,
            FormulaError::OutOfBounds(_) => CellError::Ref,
            FormulaError::DivisionByZero => CellError::Div0,
            FormulaError::ZeroToZeroPower => CellError::Num,
            FormulaError::Arithmetic(_) | FormulaError::DepthExceeded(_) => CellError::Generic,
        }
    }
}
