//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangle of cells (e.g., "A1:B10")
//! - [`CellData`] - A cell's displayed text and stored formula
//! - [`CellError`] - The error codes a formula can display

mod address;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use value::{CellData, CellError};
