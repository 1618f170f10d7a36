//! # tally-sheets-core
//!
//! Core data structures for the tally-sheets formula engine.
//!
//! This crate provides the fundamental types used throughout tally-sheets:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`CellError`] - The error codes a formula cell can display
//! - [`GridAccessor`] - The read-only grid interface the formula engine consumes
//! - [`Sheet`] - An in-memory grid implementing [`GridAccessor`]
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets_core::{GridAccessor, Sheet};
//!
//! let mut sheet = Sheet::new(5, 5);
//! sheet.set_cell_value("A1", "10").unwrap();
//! sheet.set_cell_formula("B1", "=A1*2").unwrap();
//!
//! assert_eq!(sheet.raw_text(0, 0), "10");
//! assert_eq!(sheet.stored_formula(0, 1), Some("=A1*2"));
//! ```

pub mod cell;
pub mod error;
pub mod grid;
pub mod worksheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellData, CellError, CellRange, CellRangeIterator};
pub use error::{Error, Result};
pub use grid::GridAccessor;
pub use worksheet::Sheet;
