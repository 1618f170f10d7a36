//! # tally-sheets
//!
//! A small spreadsheet formula engine.
//!
//! Tally-sheets keeps a rectangular grid of cells calculated: formulas such as
//! `=SUM(A1:B2)*2` are parsed, evaluated against the grid with
//! circular-reference detection, and rewritten when rows or columns are
//! deleted.
//!
//! ## Features
//!
//! - Arithmetic with `+ - * / ^`, unary minus and parentheses
//! - Cell and range references, `SUM`, `AVERAGE`, `MAX`, `MIN`
//! - Error codes: `#ERROR!`, `#NAME?`, `#REF!`, `#DIV/0!`, `#NUM!`, `#CIRCULAR!`
//! - Whole-sheet recalculation and a formula view
//! - Row/column insertion and deletion with `#REF!` invalidation
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets::prelude::*;
//!
//! let mut book = Spreadsheet::new(5, 5);
//! book.set_cell("A1", "10").unwrap();
//! book.set_cell("B1", "20").unwrap();
//! book.set_cell("C1", "=A1+B1*2").unwrap();
//! assert_eq!(book.display("C1").unwrap(), "50");
//!
//! // Deleting row 1 invalidates the references into it
//! book.set_cell("A2", "=A1").unwrap();
//! book.delete_row(0).unwrap();
//! assert_eq!(book.display("A1").unwrap(), "#REF!");
//! ```

pub mod calculation;
pub mod prelude;
pub mod spreadsheet;

// Re-export calculation types
pub use calculation::{recalculate, CalculationOptions, CalculationStats};
pub use spreadsheet::Spreadsheet;

// Re-export core types
pub use tally_sheets_core::{
    CellAddress, CellData, CellError, CellRange, Error, GridAccessor, Result, Sheet,
};

// Re-export formula types
pub use tally_sheets_formula::{
    evaluate, parse_formula, Dimension, DisplayMode, EngineOptions, EvaluationContext,
    FormulaCache, FormulaEngine, FormulaError, FormulaExpr, FormulaResult, FormulaRewrite,
    FormulaValue,
};
