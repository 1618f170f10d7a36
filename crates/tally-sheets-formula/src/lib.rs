//! # tally-sheets-formula
//!
//! Formula language for tally-sheets.
//!
//! This crate provides:
//! - Formula tokenizing and parsing (text → AST)
//! - Formula evaluation against any [`GridAccessor`](tally_sheets_core::GridAccessor)
//!   with circular-reference detection
//! - Built-in aggregates: SUM, AVERAGE, MAX, MIN
//! - [`FormulaEngine`], which caches parsed formulas and cell-name lookups
//! - Formula rewriting after row/column deletion
//!
//! ## Example
//!
//! ```rust
//! use tally_sheets_core::Sheet;
//! use tally_sheets_formula::{parse_formula, FormulaEngine};
//!
//! let ast = parse_formula("=sum(a1:b2)*2").unwrap();
//! assert_eq!(ast.to_text(), "SUM(A1:B2)*2");
//!
//! let mut sheet = Sheet::new(5, 5);
//! sheet.set_cell_value("A1", "10").unwrap();
//! sheet.set_cell_value("B2", "40").unwrap();
//!
//! let mut engine = FormulaEngine::new();
//! assert_eq!(engine.evaluate("=SUM(A1:B2)", &sheet), "50");
//! ```

pub mod ast;
pub mod cache;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod rewrite;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use cache::FormulaCache;
pub use engine::{EngineOptions, FormulaEngine};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext, FormulaValue, MAX_EVALUATION_NESTING};
pub use parser::{parse_formula, MAX_NESTING};
pub use rewrite::{Dimension, DisplayMode, FormulaRewrite};
