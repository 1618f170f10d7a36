//! Parse and cell-name caches
//!
//! Both caches are only valid for one grid shape. Whoever changes the row or
//! column count must call [`FormulaCache::clear`] before evaluating again.

use crate::ast::FormulaExpr;
use crate::parser::parse_formula;
use ahash::AHashMap;
use std::sync::Arc;
use tally_sheets_core::{CellAddress, CellError};
use tracing::{debug, trace};

/// Memoized formula ASTs and cell-name indices
#[derive(Debug, Default)]
pub struct FormulaCache {
    /// Formula text (exact, un-normalized) to parsed tree
    asts: AHashMap<String, Arc<FormulaExpr>>,
    /// Cell name to 0-based position
    indices: AHashMap<String, CellAddress>,
}

impl FormulaCache {
    /// Create empty caches
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a formula, reusing the tree from an earlier call with the same
    /// text
    ///
    /// Never fails: input that is not a formula or that does not parse is
    /// cached as an `#ERROR!` literal.
    pub fn parse(&mut self, formula: &str) -> Arc<FormulaExpr> {
        if let Some(ast) = self.asts.get(formula) {
            trace!(formula, "ast cache hit");
            return Arc::clone(ast);
        }

        let ast = match parse_formula(formula) {
            Ok(ast) => ast,
            Err(err) => {
                debug!(formula, error = %err, "formula did not parse");
                FormulaExpr::Error(CellError::Generic)
            }
        };

        let ast = Arc::new(ast);
        self.asts.insert(formula.to_string(), Arc::clone(&ast));
        ast
    }

    /// Resolve a cell name such as `"B7"` to its 0-based position
    ///
    /// Only successful resolutions are remembered.
    pub fn cell_indices(&mut self, name: &str) -> Option<CellAddress> {
        if let Some(addr) = self.indices.get(name) {
            return Some(*addr);
        }

        let addr = CellAddress::parse(name).ok()?;
        self.indices.insert(name.to_string(), addr);
        Some(addr)
    }

    /// Drop both caches
    pub fn clear(&mut self) {
        debug!(
            asts = self.asts.len(),
            indices = self.indices.len(),
            "clearing formula caches"
        );
        self.asts.clear();
        self.indices.clear();
    }

    /// Number of cached trees
    pub fn ast_count(&self) -> usize {
        self.asts.len()
    }

    /// Number of cached cell-name resolutions
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asts.is_empty() && self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_is_memoized() {
        let mut cache = FormulaCache::new();
        let first = cache.parse("=A1+1");
        let second = cache.parse("=A1+1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.ast_count(), 1);
    }

    #[test]
    fn test_key_is_exact_text() {
        let mut cache = FormulaCache::new();
        let upper = cache.parse("=A1");
        let lower = cache.parse("=a1");
        assert!(!Arc::ptr_eq(&upper, &lower));
        assert_eq!(*upper, *lower);
        assert_eq!(cache.ast_count(), 2);
    }

    #[test]
    fn test_failures_cache_as_error_literal() {
        let mut cache = FormulaCache::new();
        assert_eq!(
            *cache.parse("=1+"),
            FormulaExpr::Error(CellError::Generic)
        );
        assert_eq!(
            *cache.parse("=A1&B1"),
            FormulaExpr::Error(CellError::Generic)
        );
        assert_eq!(
            *cache.parse("plain text"),
            FormulaExpr::Error(CellError::Generic)
        );
        assert_eq!(cache.ast_count(), 3);
    }

    #[test]
    fn test_cell_indices() {
        let mut cache = FormulaCache::new();
        assert_eq!(cache.cell_indices("B3"), Some(CellAddress::new(2, 1)));
        assert_eq!(cache.cell_indices("AA1"), Some(CellAddress::new(0, 26)));
        assert_eq!(cache.cell_indices("A0"), None);
        assert_eq!(cache.cell_indices("12"), None);
        assert_eq!(cache.index_count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = FormulaCache::new();
        cache.parse("=1");
        cache.cell_indices("A1");
        assert!(!cache.is_empty());
        cache.clear();
        assert!(cache.is_empty());
    }
}
