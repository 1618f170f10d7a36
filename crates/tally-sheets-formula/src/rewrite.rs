//! Formula rewriting after structural edits
//!
//! When a row or column is deleted, every stored formula goes through two
//! passes: references into the deleted row/column become `#REF!`, then
//! references that fall outside the shrunk grid become `#REF!` as well.
//! References are never renumbered.

use crate::ast::FormulaExpr;
use crate::cache::FormulaCache;
use std::fmt;
use tally_sheets_core::{CellAddress, CellError, CellRange, GridAccessor};
use tracing::debug;

/// Grid dimension touched by a structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Row,
    Column,
}

impl Dimension {
    /// Coordinate of `addr` along this dimension
    pub fn coordinate(&self, addr: &CellAddress) -> u32 {
        match self {
            Dimension::Row => addr.row,
            Dimension::Column => addr.col,
        }
    }

    fn spans(&self, range: &CellRange, index: u32) -> bool {
        match self {
            Dimension::Row => range.spans_row(index),
            Dimension::Column => range.spans_col(index),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Row => f.write_str("row"),
            Dimension::Column => f.write_str("column"),
        }
    }
}

/// What formula cells display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// Evaluated results
    #[default]
    Values,
    /// Formula text
    Formulas,
}

/// A replacement formula for one cell
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaRewrite {
    /// 0-based row of the cell
    pub row: u32,
    /// 0-based column of the cell
    pub col: u32,
    /// New stored formula, including the leading `=`
    pub formula: String,
    /// New display text, or `None` to leave it for the next recalculation
    pub display: Option<String>,
}

/// Invalidate references into a deleted row or column
///
/// A cell reference on the deleted index, or a range whose span covers it,
/// becomes a `#REF!` literal. A cell name that no longer resolves becomes
/// `#NAME?`. Everything else is rebuilt unchanged.
pub fn transform_on_delete(
    expr: &FormulaExpr,
    dimension: Dimension,
    index: u32,
    cache: &mut FormulaCache,
) -> FormulaExpr {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::Error(_) => expr.clone(),

        FormulaExpr::CellRef(name) => match cache.cell_indices(name) {
            None => FormulaExpr::Error(CellError::Name),
            Some(addr) if dimension.coordinate(&addr) == index => {
                FormulaExpr::Error(CellError::Ref)
            }
            Some(_) => expr.clone(),
        },

        FormulaExpr::RangeRef { start, end } => {
            match (cache.cell_indices(start), cache.cell_indices(end)) {
                (Some(a), Some(b)) => {
                    if dimension.spans(&CellRange::new(a, b), index) {
                        FormulaExpr::Error(CellError::Ref)
                    } else {
                        expr.clone()
                    }
                }
                _ => FormulaExpr::Error(CellError::Name),
            }
        }

        FormulaExpr::BinaryOp { op, left, right } => FormulaExpr::binary(
            *op,
            transform_on_delete(left, dimension, index, cache),
            transform_on_delete(right, dimension, index, cache),
        ),

        FormulaExpr::UnaryOp { op, operand } => FormulaExpr::UnaryOp {
            op: *op,
            operand: Box::new(transform_on_delete(operand, dimension, index, cache)),
        },

        FormulaExpr::Function { name, args } => FormulaExpr::Function {
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| transform_on_delete(arg, dimension, index, cache))
                .collect(),
        },
    }
}

/// Replace references outside the grid's current shape with `#REF!`
///
/// Names that do not resolve are left as they are.
pub fn check_bounds_after_delete<G: GridAccessor + ?Sized>(
    expr: &FormulaExpr,
    grid: &G,
    cache: &mut FormulaCache,
) -> FormulaExpr {
    match expr {
        FormulaExpr::Number(_) | FormulaExpr::Error(_) => expr.clone(),

        FormulaExpr::CellRef(name) => match cache.cell_indices(name) {
            Some(addr) if !grid.contains(addr.row, addr.col) => FormulaExpr::Error(CellError::Ref),
            _ => expr.clone(),
        },

        FormulaExpr::RangeRef { start, end } => {
            match (cache.cell_indices(start), cache.cell_indices(end)) {
                (Some(a), Some(b)) if !grid.contains(a.row, a.col) || !grid.contains(b.row, b.col) => {
                    FormulaExpr::Error(CellError::Ref)
                }
                _ => expr.clone(),
            }
        }

        FormulaExpr::BinaryOp { op, left, right } => FormulaExpr::binary(
            *op,
            check_bounds_after_delete(left, grid, cache),
            check_bounds_after_delete(right, grid, cache),
        ),

        FormulaExpr::UnaryOp { op, operand } => FormulaExpr::UnaryOp {
            op: *op,
            operand: Box::new(check_bounds_after_delete(operand, grid, cache)),
        },

        FormulaExpr::Function { name, args } => FormulaExpr::Function {
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| check_bounds_after_delete(arg, grid, cache))
                .collect(),
        },
    }
}

/// Compute the rewrites every formula cell of `grid` needs after `index`
/// was deleted along `dimension`
///
/// `grid` must already have its post-deletion shape and `cache` must have
/// been cleared since the shape changed. Cells whose tree is unchanged get
/// no rewrite.
pub fn rewrite_after_delete<G: GridAccessor + ?Sized>(
    grid: &G,
    cache: &mut FormulaCache,
    dimension: Dimension,
    index: u32,
    mode: DisplayMode,
) -> Vec<FormulaRewrite> {
    let mut rewrites = Vec::new();

    for row in 0..grid.row_count() {
        for col in 0..grid.column_count() {
            let formula = match grid.stored_formula(row, col) {
                Some(formula) => formula,
                None => continue,
            };

            let ast = cache.parse(formula);
            let mut updated = transform_on_delete(&ast, dimension, index, cache);
            if !updated.is_error() {
                updated = check_bounds_after_delete(&updated, grid, cache);
            }

            if updated == *ast {
                continue;
            }

            let new_formula = format!("={}", updated.to_text());
            debug!(
                cell = %CellAddress::new(row, col),
                from = formula,
                to = %new_formula,
                "rewriting formula"
            );

            let display = match (mode, &updated) {
                (DisplayMode::Formulas, _) => Some(new_formula.clone()),
                (DisplayMode::Values, FormulaExpr::Error(code)) => Some(code.to_string()),
                (DisplayMode::Values, _) => None,
            };

            rewrites.push(FormulaRewrite {
                row,
                col,
                formula: new_formula,
                display,
            });
        }
    }

    rewrites
}
