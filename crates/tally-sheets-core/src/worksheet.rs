//! In-memory sheet

use crate::cell::{CellAddress, CellData};
use crate::error::{Error, Result};
use crate::grid::GridAccessor;

/// A dense rectangular grid of cells
///
/// Every position inside the shape holds a [`CellData`]; rows and columns can
/// be inserted or removed, which shifts the cells after them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    /// Cells, row-major
    cells: Vec<Vec<CellData>>,
    /// Column count (kept separately so zero-row sheets keep their width)
    columns: u32,
}

impl Sheet {
    /// Create an empty sheet with the given shape
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            cells: (0..rows)
                .map(|_| vec![CellData::default(); columns as usize])
                .collect(),
            columns,
        }
    }

    /// Number of rows
    pub fn row_count(&self) -> u32 {
        self.cells.len() as u32
    }

    /// Number of columns
    pub fn column_count(&self) -> u32 {
        self.columns
    }

    // === Cell Access ===

    /// Get a cell by address string (e.g., "A1")
    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_at(addr.row, addr.col))
    }

    /// Get a cell by row and column indices
    pub fn cell_at(&self, row: u32, col: u32) -> Option<&CellData> {
        self.cells
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
    }

    /// Get a mutable cell by row and column indices
    pub fn cell_at_mut(&mut self, row: u32, col: u32) -> Result<&mut CellData> {
        self.validate_cell_position(row, col)?;
        Ok(&mut self.cells[row as usize][col as usize])
    }

    /// Set the text of a cell, keeping its stored formula
    pub fn set_text<S: Into<String>>(&mut self, row: u32, col: u32, text: S) -> Result<()> {
        self.cell_at_mut(row, col)?.text = text.into();
        Ok(())
    }

    /// Set or clear the stored formula of a cell
    pub fn set_formula(&mut self, row: u32, col: u32, formula: Option<String>) -> Result<()> {
        if let Some(text) = &formula {
            if !text.starts_with('=') {
                return Err(Error::other(format!(
                    "Formula must start with '=': {}",
                    text
                )));
            }
        }
        self.cell_at_mut(row, col)?.formula = formula;
        Ok(())
    }

    /// Set a plain text value by address string, clearing any formula
    pub fn set_cell_value<S: Into<String>>(&mut self, address: &str, text: S) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        *self.cell_at_mut(addr.row, addr.col)? = CellData::text(text);
        Ok(())
    }

    /// Set a formula by address string; its display is left empty until
    /// the sheet is recalculated
    pub fn set_cell_formula<S: Into<String>>(&mut self, address: &str, formula: S) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.cell_at_mut(addr.row, addr.col)?.text = String::new();
        self.set_formula(addr.row, addr.col, Some(formula.into()))
    }

    /// Validate cell position
    fn validate_cell_position(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.row_count() {
            return Err(Error::RowOutOfBounds(row, self.row_count()));
        }
        if col >= self.columns {
            return Err(Error::ColumnOutOfBounds(col, self.columns));
        }
        Ok(())
    }

    /// Iterate over all cells: (row, col, cell), row-major
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u32, &CellData)> {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(move |(col, cell)| (row as u32, col as u32, cell))
        })
    }

    /// Iterate over all formula cells: (row, col, formula_text)
    pub fn formula_cells(&self) -> impl Iterator<Item = (u32, u32, &str)> {
        self.iter_cells()
            .filter_map(|(row, col, cell)| cell.formula.as_deref().map(|f| (row, col, f)))
    }

    // === Structure ===

    /// Insert an empty row before `at` (`at == row_count` appends)
    pub fn insert_row(&mut self, at: u32) -> Result<()> {
        if at > self.row_count() {
            return Err(Error::RowOutOfBounds(at, self.row_count()));
        }
        self.cells.insert(
            at as usize,
            vec![CellData::default(); self.columns as usize],
        );
        Ok(())
    }

    /// Remove row `at`, shifting later rows up
    pub fn delete_row(&mut self, at: u32) -> Result<()> {
        if at >= self.row_count() {
            return Err(Error::RowOutOfBounds(at, self.row_count()));
        }
        self.cells.remove(at as usize);
        Ok(())
    }

    /// Insert an empty column before `at` (`at == column_count` appends)
    pub fn insert_column(&mut self, at: u32) -> Result<()> {
        if at > self.columns {
            return Err(Error::ColumnOutOfBounds(at, self.columns));
        }
        for row in &mut self.cells {
            row.insert(at as usize, CellData::default());
        }
        self.columns += 1;
        Ok(())
    }

    /// Remove column `at`, shifting later columns left
    pub fn delete_column(&mut self, at: u32) -> Result<()> {
        if at >= self.columns {
            return Err(Error::ColumnOutOfBounds(at, self.columns));
        }
        for row in &mut self.cells {
            row.remove(at as usize);
        }
        self.columns -= 1;
        Ok(())
    }
}

impl GridAccessor for Sheet {
    fn row_count(&self) -> u32 {
        Sheet::row_count(self)
    }

    fn column_count(&self) -> u32 {
        Sheet::column_count(self)
    }

    fn raw_text(&self, row: u32, col: u32) -> &str {
        self.cell_at(row, col).map_or("", |cell| cell.text.as_str())
    }

    fn stored_formula(&self, row: u32, col: u32) -> Option<&str> {
        self.cell_at(row, col).and_then(|cell| cell.formula.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Sheet {
        let mut sheet = Sheet::new(3, 3);
        sheet.set_cell_value("A1", "10").unwrap();
        sheet.set_cell_value("B2", "20").unwrap();
        sheet.set_cell_formula("C3", "=A1+B2").unwrap();
        sheet
    }

    #[test]
    fn test_new_sheet_shape() {
        let sheet = Sheet::new(5, 4);
        assert_eq!(sheet.row_count(), 5);
        assert_eq!(sheet.column_count(), 4);
        assert!(sheet.iter_cells().all(|(_, _, c)| c.is_empty()));
        assert_eq!(sheet.iter_cells().count(), 20);
    }

    #[test]
    fn test_grid_accessor() {
        let sheet = sample();
        assert_eq!(sheet.raw_text(0, 0), "10");
        assert_eq!(sheet.stored_formula(2, 2), Some("=A1+B2"));
        assert_eq!(sheet.stored_formula(0, 0), None);
        // Outside the grid
        assert_eq!(sheet.raw_text(10, 10), "");
        assert_eq!(sheet.stored_formula(10, 10), None);
        assert!(sheet.contains(2, 2));
        assert!(!sheet.contains(3, 0));
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut sheet = Sheet::new(2, 2);
        assert!(matches!(
            sheet.set_text(2, 0, "x"),
            Err(Error::RowOutOfBounds(2, 2))
        ));
        assert!(matches!(
            sheet.set_cell_value("C1", "x"),
            Err(Error::ColumnOutOfBounds(2, 2))
        ));
        assert!(sheet.set_formula(0, 0, Some("A1".into())).is_err());
    }

    #[test]
    fn test_formula_cells() {
        let sheet = sample();
        let formulas: Vec<_> = sheet.formula_cells().collect();
        assert_eq!(formulas, vec![(2, 2, "=A1+B2")]);
    }

    #[test]
    fn test_delete_row_shifts_cells() {
        let mut sheet = sample();
        sheet.delete_row(0).unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.raw_text(0, 1), "20");
        assert_eq!(sheet.stored_formula(1, 2), Some("=A1+B2"));
        assert!(sheet.delete_row(2).is_err());
    }

    #[test]
    fn test_delete_column_shifts_cells() {
        let mut sheet = sample();
        sheet.delete_column(1).unwrap();
        assert_eq!(sheet.column_count(), 2);
        assert_eq!(sheet.raw_text(0, 0), "10");
        assert_eq!(sheet.stored_formula(2, 1), Some("=A1+B2"));
    }

    #[test]
    fn test_insert_row_and_column() {
        let mut sheet = sample();
        sheet.insert_row(0).unwrap();
        sheet.insert_column(3).unwrap();
        assert_eq!(sheet.row_count(), 4);
        assert_eq!(sheet.column_count(), 4);
        assert_eq!(sheet.raw_text(1, 0), "10");
        assert!(sheet.insert_row(9).is_err());
        assert!(sheet.insert_column(9).is_err());
    }

    #[test]
    fn test_zero_row_sheet_keeps_width() {
        let mut sheet = Sheet::new(1, 3);
        sheet.delete_row(0).unwrap();
        assert_eq!(sheet.row_count(), 0);
        assert_eq!(sheet.column_count(), 3);
        sheet.insert_row(0).unwrap();
        assert_eq!(sheet.cell_at(0, 2), Some(&CellData::default()));
    }
}
