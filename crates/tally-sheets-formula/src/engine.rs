//! Formula engine
//!
//! The single entry point hosts call: evaluate a formula string against a
//! grid and get back display text, or compute the formula rewrites a
//! structural edit requires.

use crate::ast::FormulaExpr;
use crate::cache::FormulaCache;
use crate::error::FormulaResult;
use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
use crate::rewrite::{rewrite_after_delete, Dimension, DisplayMode, FormulaRewrite};
use std::sync::Arc;
use tally_sheets_core::GridAccessor;
use tracing::info;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Longest chain of formula cells one evaluation may follow before it
    /// fails with `#ERROR!`
    pub max_depth: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self { max_depth: 1000 }
    }
}

/// Formula engine with parse and cell-name caches
///
/// The caches belong to one grid shape: call [`FormulaEngine::clear_caches`]
/// whenever rows or columns are inserted or removed.
///
/// # Example
/// ```rust
/// use tally_sheets_core::Sheet;
/// use tally_sheets_formula::FormulaEngine;
///
/// let mut sheet = Sheet::new(5, 5);
/// sheet.set_cell_value("A1", "10").unwrap();
/// sheet.set_cell_value("B1", "20").unwrap();
///
/// let mut engine = FormulaEngine::new();
/// assert_eq!(engine.evaluate("=A1+B1*2", &sheet), "50");
/// assert_eq!(engine.evaluate("=A1/0", &sheet), "#DIV/0!");
/// assert_eq!(engine.evaluate("plain", &sheet), "plain");
/// ```
#[derive(Debug, Default)]
pub struct FormulaEngine {
    options: EngineOptions,
    cache: FormulaCache,
}

impl FormulaEngine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with the given options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            cache: FormulaCache::new(),
        }
    }

    /// Engine options
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The parse and cell-name caches
    pub fn cache(&self) -> &FormulaCache {
        &self.cache
    }

    /// Parse a formula through the AST cache
    ///
    /// Non-formula and malformed input yields an `#ERROR!` literal.
    pub fn parse(&mut self, formula: &str) -> Arc<FormulaExpr> {
        self.cache.parse(formula)
    }

    /// Evaluate a formula to the text a cell displays
    ///
    /// Input that does not start with `=` is returned unchanged. Any
    /// evaluation failure is returned as its error code.
    pub fn evaluate<G: GridAccessor + ?Sized>(&mut self, formula: &str, grid: &G) -> String {
        if !formula.starts_with('=') {
            return formula.to_string();
        }

        match self.evaluate_value(formula, grid) {
            Ok(value) => value.as_string(),
            Err(err) => err.cell_error().to_string(),
        }
    }

    /// Evaluate a formula to a typed value
    pub fn evaluate_value<G: GridAccessor + ?Sized>(
        &mut self,
        formula: &str,
        grid: &G,
    ) -> FormulaResult<FormulaValue> {
        let ast = self.cache.parse(formula);
        let mut ctx = EvaluationContext::new(grid, &mut self.cache, self.options.max_depth);
        evaluate(&ast, &mut ctx)
    }

    /// Drop the AST and cell-name caches
    pub fn clear_caches(&mut self) {
        self.cache.clear();
    }

    /// Rewrite formulas after a row or column was deleted
    ///
    /// `grid` must already have its post-deletion shape. The caches are
    /// cleared first; the returned rewrites are for the host to apply.
    pub fn on_dimension_deleted<G: GridAccessor + ?Sized>(
        &mut self,
        dimension: Dimension,
        index: u32,
        grid: &G,
        mode: DisplayMode,
    ) -> Vec<FormulaRewrite> {
        self.clear_caches();
        let rewrites = rewrite_after_delete(grid, &mut self.cache, dimension, index, mode);
        info!(
            %dimension,
            index,
            rewritten = rewrites.len(),
            "formulas updated after delete"
        );
        rewrites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormulaError;
    use pretty_assertions::assert_eq;
    use tally_sheets_core::{CellError, Sheet};

    fn sample_sheet() -> Sheet {
        let mut sheet = Sheet::new(5, 5);
        sheet.set_cell_value("A1", "10").unwrap();
        sheet.set_cell_value("B1", "20").unwrap();
        sheet.set_cell_value("A2", "30").unwrap();
        sheet.set_cell_value("B2", "40").unwrap();
        sheet
    }

    #[test]
    fn test_evaluate_display() {
        let sheet = sample_sheet();
        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate("=SUM(A1:B2)", &sheet), "100");
        assert_eq!(engine.evaluate("=A1/4", &sheet), "2.5");
        assert_eq!(engine.evaluate("=A1:B1", &sheet), "{10,20}");
        assert_eq!(engine.evaluate("=", &sheet), "0");
    }

    #[test]
    fn test_non_formula_passes_through() {
        let sheet = sample_sheet();
        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate("hello", &sheet), "hello");
        assert_eq!(engine.evaluate("", &sheet), "");
        assert_eq!(engine.evaluate(" =1", &sheet), " =1");
    }

    #[test]
    fn test_error_codes() {
        let sheet = sample_sheet();
        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate("=1+", &sheet), "#ERROR!");
        assert_eq!(engine.evaluate("=A1&B1", &sheet), "#ERROR!");
        assert_eq!(engine.evaluate("=FOO(1)", &sheet), "#NAME?");
        assert_eq!(engine.evaluate("=Z99", &sheet), "#REF!");
        assert_eq!(engine.evaluate("=A1/0", &sheet), "#DIV/0!");
        assert_eq!(engine.evaluate("=0^0", &sheet), "#NUM!");
    }

    #[test]
    fn test_oversized_literal() {
        let sheet = sample_sheet();
        let mut engine = FormulaEngine::new();
        let nines = "9".repeat(400);
        assert_eq!(engine.evaluate(&format!("={}", nines), &sheet), "#ERROR!");
        assert_eq!(engine.evaluate(&format!("=-{}", nines), &sheet), "#ERROR!");
        assert_eq!(engine.evaluate(&format!("=-{}+1", nines), &sheet), "#ERROR!");
    }

    #[test]
    fn test_evaluate_value() {
        let sheet = sample_sheet();
        let mut engine = FormulaEngine::new();
        assert_eq!(
            engine.evaluate_value("=MAX(A1,B1,5)", &sheet),
            Ok(FormulaValue::Number(20.0))
        );
        assert_eq!(
            engine.evaluate_value("=#NAME?", &sheet),
            Err(FormulaError::Literal(CellError::Name))
        );
    }

    #[test]
    fn test_parse_uses_cache() {
        let mut engine = FormulaEngine::new();
        let first = engine.parse("=A1+1");
        let second = engine.parse("=A1+1");
        assert!(Arc::ptr_eq(&first, &second));
        engine.clear_caches();
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn test_depth_option() {
        let mut sheet = Sheet::new(10, 1);
        for row in 2..=10 {
            sheet
                .set_cell_formula(&format!("A{}", row), format!("=A{}", row - 1))
                .unwrap();
        }
        let mut tight = FormulaEngine::with_options(EngineOptions { max_depth: 4 });
        assert_eq!(tight.evaluate("=A10", &sheet), "#ERROR!");

        let mut engine = FormulaEngine::new();
        assert_eq!(engine.options().max_depth, 1000);
        assert_eq!(engine.evaluate("=A10", &sheet), "0");
    }

    #[test]
    fn test_on_dimension_deleted_clears_caches() {
        let mut sheet = sample_sheet();
        sheet.set_cell_formula("C1", "=A2+1").unwrap();

        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate("=C1", &sheet), "31");
        assert!(!engine.cache().is_empty());

        sheet.delete_row(1).unwrap();
        let rewrites = engine.on_dimension_deleted(Dimension::Row, 1, &sheet, DisplayMode::Values);
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].formula, "=#REF!+1");
        // Only the parse of C1's formula remains cached
        assert_eq!(engine.cache().ast_count(), 1);
    }

    #[test]
    fn test_overlong_formula_survives_delete() {
        let mut sheet = Sheet::new(3, 3);
        let formula = format!("=A2{}", "+1".repeat(10_000));
        sheet.set_cell_formula("C1", formula.clone()).unwrap();

        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate(&formula, &sheet), "#ERROR!");

        sheet.delete_row(1).unwrap();
        let rewrites = engine.on_dimension_deleted(Dimension::Row, 1, &sheet, DisplayMode::Values);
        assert!(rewrites.is_empty());
        assert_eq!(sheet.stored_formula(0, 2), Some(formula.as_str()));
    }

    #[test]
    fn test_long_running_total() {
        let mut sheet = Sheet::new(600, 2);
        for row in 1..=600 {
            sheet.set_cell_value(&format!("A{}", row), "2").unwrap();
            let formula = if row == 1 {
                "=A1".to_string()
            } else {
                format!("=B{}+A{}", row - 1, row)
            };
            sheet.set_cell_formula(&format!("B{}", row), formula).unwrap();
        }

        let mut engine = FormulaEngine::new();
        assert_eq!(engine.evaluate("=B300", &sheet), "600");
        assert_eq!(engine.evaluate("=B600", &sheet), "1200");
    }
}
