//! Whole-sheet recalculation
//!
//! Recalculation walks every formula cell in row-major order and refreshes
//! its displayed text. There is no dependency graph: the walk is repeated
//! a fixed number of times so that formulas reading cells further down the
//! sheet settle.
//!
//! # Example
//!
//! ```rust
//! use tally_sheets::prelude::*;
//! use tally_sheets::calculation::recalculate;
//!
//! let mut sheet = Sheet::new(3, 1);
//! sheet.set_cell_formula("A1", "=A2*2").unwrap();
//! sheet.set_cell_formula("A2", "=A3+1").unwrap();
//! sheet.set_cell_value("A3", "4").unwrap();
//!
//! let mut engine = FormulaEngine::new();
//! let stats = recalculate(&mut sheet, &mut engine, &CalculationOptions::default()).unwrap();
//! assert_eq!(stats.formula_count, 2);
//! assert_eq!(sheet.cell("A1").unwrap().unwrap().text, "10");
//! ```

use crate::{CellError, FormulaEngine, Result, Sheet};
use tracing::info;

/// Options for sheet recalculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationOptions {
    /// Number of row-major passes over the sheet (default: 2)
    pub passes: usize,
    /// Show formula text instead of evaluated results
    pub formula_view: bool,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            passes: 2,
            formula_view: false,
        }
    }
}

/// Statistics from a recalculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CalculationStats {
    /// Total number of formula cells
    pub formula_count: usize,
    /// Number of display texts written, over all passes
    pub cells_updated: usize,
    /// Number of passes performed
    pub passes: usize,
    /// Formula cells showing an error code after the last pass
    pub errors: usize,
    /// Formula cells showing `#CIRCULAR!` after the last pass
    pub circular_references: usize,
}

/// Recalculate every formula cell of `sheet`
///
/// A cell's text is only written when it differs from what the cell already
/// displays.
pub fn recalculate(
    sheet: &mut Sheet,
    engine: &mut FormulaEngine,
    options: &CalculationOptions,
) -> Result<CalculationStats> {
    let mut stats = CalculationStats::default();

    // Snapshot the formulas; their displays change while we walk
    let formulas: Vec<(u32, u32, String)> = sheet
        .formula_cells()
        .map(|(row, col, formula)| (row, col, formula.to_string()))
        .collect();
    stats.formula_count = formulas.len();

    if formulas.is_empty() {
        return Ok(stats);
    }

    for pass in 0..options.passes {
        let last = pass + 1 == options.passes;
        stats.passes += 1;

        for (row, col, formula) in &formulas {
            let display = if options.formula_view {
                formula.clone()
            } else {
                engine.evaluate(formula, &*sheet)
            };

            if last {
                match CellError::from_str(&display) {
                    Some(CellError::Circular) => {
                        stats.errors += 1;
                        stats.circular_references += 1;
                    }
                    Some(_) => stats.errors += 1,
                    None => {}
                }
            }

            let current = sheet.cell_at(*row, *col).map(|cell| cell.text.as_str());
            if current != Some(display.as_str()) {
                sheet.set_text(*row, *col, display)?;
                stats.cells_updated += 1;
            }
        }
    }

    info!(
        formulas = stats.formula_count,
        updated = stats.cells_updated,
        errors = stats.errors,
        circular = stats.circular_references,
        "recalculated sheet"
    );

    Ok(stats)
}
