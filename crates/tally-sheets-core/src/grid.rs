//! Read-only view of a rectangular cell grid
//!
//! The formula engine never owns or mutates cells. Hosts expose their grid
//! through [`GridAccessor`] and apply any changes the engine reports.

/// Read access to a grid's shape and cell contents
///
/// Indices are 0-based. Implementations should return an empty string and
/// `None` for positions outside the grid rather than panicking.
pub trait GridAccessor {
    /// Number of rows currently in the grid
    fn row_count(&self) -> u32;

    /// Number of columns currently in the grid
    fn column_count(&self) -> u32;

    /// Raw text of the cell at `(row, col)`
    fn raw_text(&self, row: u32, col: u32) -> &str;

    /// Stored formula of the cell at `(row, col)`, if it is a formula cell
    fn stored_formula(&self, row: u32, col: u32) -> Option<&str>;

    /// Check whether `(row, col)` lies inside the grid
    fn contains(&self, row: u32, col: u32) -> bool {
        row < self.row_count() && col < self.column_count()
    }
}

impl<G: GridAccessor + ?Sized> GridAccessor for &G {
    fn row_count(&self) -> u32 {
        (**self).row_count()
    }

    fn column_count(&self) -> u32 {
        (**self).column_count()
    }

    fn raw_text(&self, row: u32, col: u32) -> &str {
        (**self).raw_text(row, col)
    }

    fn stored_formula(&self, row: u32, col: u32) -> Option<&str> {
        (**self).stored_formula(row, col)
    }
}
