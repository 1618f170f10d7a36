//! Prelude module - common imports for tally-sheets users
//!
//! ```rust
//! use tally_sheets::prelude::*;
//! ```

pub use crate::{
    // Calculation types
    CalculationOptions,
    CalculationStats,
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    // Structural edits
    Dimension,
    DisplayMode,
    // Error types
    Error,
    // Formula engine
    FormulaEngine,
    FormulaValue,
    GridAccessor,
    Result,
    // Main types
    Sheet,
    Spreadsheet,
};
