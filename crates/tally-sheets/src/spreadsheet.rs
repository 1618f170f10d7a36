//! A sheet together with the formula engine that keeps it calculated

use crate::calculation::{recalculate, CalculationOptions, CalculationStats};
use crate::{
    CellAddress, Dimension, DisplayMode, EngineOptions, FormulaEngine, Result, Sheet,
};
use tracing::info;

/// An editable sheet whose formula cells are kept up to date
///
/// Every edit recalculates the whole sheet. Shape changes clear the
/// engine's caches before anything is evaluated again.
///
/// # Example
///
/// ```rust
/// use tally_sheets::prelude::*;
///
/// let mut book = Spreadsheet::new(5, 5);
/// book.set_cell("A1", "10").unwrap();
/// book.set_cell("B1", "=A1*3").unwrap();
/// assert_eq!(book.display("B1").unwrap(), "30");
///
/// book.set_formula_view(true).unwrap();
/// assert_eq!(book.display("B1").unwrap(), "=A1*3");
/// ```
#[derive(Debug)]
pub struct Spreadsheet {
    sheet: Sheet,
    engine: FormulaEngine,
    options: CalculationOptions,
}

impl Spreadsheet {
    /// Create an empty spreadsheet with default options
    pub fn new(rows: u32, columns: u32) -> Self {
        Self::from_sheet(Sheet::new(rows, columns))
    }

    /// Wrap an existing sheet
    ///
    /// The sheet is not recalculated until the first edit or an explicit
    /// [`Spreadsheet::recalculate`].
    pub fn from_sheet(sheet: Sheet) -> Self {
        Self {
            sheet,
            engine: FormulaEngine::new(),
            options: CalculationOptions::default(),
        }
    }

    /// Create an empty spreadsheet with custom options
    pub fn with_options(
        rows: u32,
        columns: u32,
        calculation: CalculationOptions,
        engine: EngineOptions,
    ) -> Self {
        Self {
            sheet: Sheet::new(rows, columns),
            engine: FormulaEngine::with_options(engine),
            options: calculation,
        }
    }

    /// The underlying sheet
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// The formula engine
    pub fn engine(&mut self) -> &mut FormulaEngine {
        &mut self.engine
    }

    /// Recalculation options
    pub fn options(&self) -> &CalculationOptions {
        &self.options
    }

    /// Current display mode
    pub fn display_mode(&self) -> DisplayMode {
        if self.options.formula_view {
            DisplayMode::Formulas
        } else {
            DisplayMode::Values
        }
    }

    /// Text a cell currently displays (e.g. "A1")
    pub fn display(&self, address: &str) -> Result<&str> {
        let addr = CellAddress::parse(address)?;
        Ok(self
            .sheet
            .cell_at(addr.row, addr.col)
            .map_or("", |cell| cell.text.as_str()))
    }

    /// Enter text into a cell as a user would
    ///
    /// Input starting with `=` becomes the cell's formula; anything else is
    /// stored as plain text and clears a previous formula. The whole sheet is
    /// recalculated afterwards.
    pub fn set_cell(&mut self, address: &str, input: &str) -> Result<CalculationStats> {
        let addr = CellAddress::parse(address)?;

        if input.starts_with('=') {
            self.sheet
                .set_formula(addr.row, addr.col, Some(input.to_string()))?;
            let display = match self.display_mode() {
                DisplayMode::Formulas => input.to_string(),
                DisplayMode::Values => self.engine.evaluate(input, &self.sheet),
            };
            self.sheet.set_text(addr.row, addr.col, display)?;
        } else {
            self.sheet.set_cell_value(address, input)?;
        }

        self.recalculate()
    }

    /// Evaluate a formula against the current sheet without storing it
    pub fn evaluate(&mut self, formula: &str) -> String {
        self.engine.evaluate(formula, &self.sheet)
    }

    /// Recalculate every formula cell
    pub fn recalculate(&mut self) -> Result<CalculationStats> {
        recalculate(&mut self.sheet, &mut self.engine, &self.options)
    }

    /// Switch between showing results and showing formulas
    pub fn set_formula_view(&mut self, enabled: bool) -> Result<CalculationStats> {
        self.options.formula_view = enabled;
        self.recalculate()
    }

    // === Structure ===

    /// Insert an empty row before row index `at`
    pub fn insert_row(&mut self, at: u32) -> Result<CalculationStats> {
        self.sheet.insert_row(at)?;
        self.engine.clear_caches();
        info!(row = at, "inserted row");
        self.recalculate()
    }

    /// Insert an empty column before column index `at`
    pub fn insert_column(&mut self, at: u32) -> Result<CalculationStats> {
        self.sheet.insert_column(at)?;
        self.engine.clear_caches();
        info!(column = at, "inserted column");
        self.recalculate()
    }

    /// Delete row index `at`, invalidating formulas that referenced it
    pub fn delete_row(&mut self, at: u32) -> Result<CalculationStats> {
        self.sheet.delete_row(at)?;
        self.after_delete(Dimension::Row, at)
    }

    /// Delete column index `at`, invalidating formulas that referenced it
    pub fn delete_column(&mut self, at: u32) -> Result<CalculationStats> {
        self.sheet.delete_column(at)?;
        self.after_delete(Dimension::Column, at)
    }

    fn after_delete(&mut self, dimension: Dimension, index: u32) -> Result<CalculationStats> {
        let mode = self.display_mode();
        let rewrites = self
            .engine
            .on_dimension_deleted(dimension, index, &self.sheet, mode);

        for rewrite in rewrites {
            self.sheet
                .set_formula(rewrite.row, rewrite.col, Some(rewrite.formula))?;
            if let Some(display) = rewrite.display {
                self.sheet.set_text(rewrite.row, rewrite.col, display)?;
            }
        }

        info!(%dimension, index, "deleted");
        self.recalculate()
    }
}
