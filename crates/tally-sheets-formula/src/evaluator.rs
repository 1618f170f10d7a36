//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`GridAccessor`] to produce values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::cache::FormulaCache;
use crate::error::{FormulaError, FormulaResult};
use crate::functions;
use ahash::AHashSet;
use std::fmt;
use std::sync::Arc;
use tally_sheets_core::{CellAddress, CellError, CellRange, GridAccessor};
use tracing::trace;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    /// Cell values collected from a range, row-major
    List(Vec<f64>),
}

impl FormulaValue {
    /// Convert to number, if possible
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::List(_) => None,
        }
    }

    /// Force conversion to number for arithmetic
    pub fn to_number(&self) -> FormulaResult<f64> {
        self.as_number()
            .ok_or_else(|| FormulaError::Arithmetic("Cannot use a range as a number".into()))
    }

    /// Convert to the string a cell displays
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::List(values) => {
                let items: Vec<String> = values.iter().map(|n| format_number(*n)).collect();
                format!("{{{}}}", items.join(","))
            }
        }
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

fn format_number(n: f64) -> String {
    // No trailing ".0" on whole numbers; also folds -0 into 0
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Deepest expression nesting across all cells on one evaluation path
///
/// Parsed formulas are shallow on their own; this bounds a long chain of
/// cells whose formulas are each nested deeply.
pub const MAX_EVALUATION_NESTING: usize = 2048;

/// Context for one top-level evaluation
///
/// The visited set holds the cells whose resolution is in progress on the
/// current call path. It is created fresh for every top-level evaluation and
/// never shared between them.
pub struct EvaluationContext<'a, G: GridAccessor + ?Sized> {
    /// Grid the references resolve against
    pub grid: &'a G,
    /// Parse and cell-name caches
    pub cache: &'a mut FormulaCache,
    visited: AHashSet<CellAddress>,
    nesting: usize,
    max_depth: usize,
}

impl<'a, G: GridAccessor + ?Sized> EvaluationContext<'a, G> {
    /// Create a new evaluation context
    ///
    /// `max_depth` is the longest chain of formula cells one evaluation may
    /// follow.
    pub fn new(grid: &'a G, cache: &'a mut FormulaCache, max_depth: usize) -> Self {
        Self {
            grid,
            cache,
            visited: AHashSet::new(),
            nesting: 0,
            max_depth,
        }
    }
}

/// Evaluate a formula expression
pub fn evaluate<G: GridAccessor + ?Sized>(
    expr: &FormulaExpr,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    if ctx.nesting >= MAX_EVALUATION_NESTING {
        return Err(FormulaError::DepthExceeded(MAX_EVALUATION_NESTING));
    }

    ctx.nesting += 1;
    let result = evaluate_expr(expr, ctx);
    ctx.nesting -= 1;
    result
}

fn evaluate_expr<G: GridAccessor + ?Sized>(
    expr: &FormulaExpr,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::Number(*n)),
        FormulaExpr::Error(e) => Err(FormulaError::Literal(*e)),

        // === References ===
        FormulaExpr::CellRef(name) => evaluate_cell_ref(name, ctx),

        FormulaExpr::RangeRef { start, end } => evaluate_range(start, end, ctx),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate a single cell reference
fn evaluate_cell_ref<G: GridAccessor + ?Sized>(
    name: &str,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    let addr = ctx
        .cache
        .cell_indices(name)
        .ok_or_else(|| FormulaError::InvalidName(name.to_string()))?;
    evaluate_cell(name, addr, ctx)
}

/// Resolve one cell, tracking it as in progress on the current path
///
/// Cells are tracked by position, so `A1` and `A01` are the same cell.
fn evaluate_cell<G: GridAccessor + ?Sized>(
    name: &str,
    addr: CellAddress,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    if ctx.visited.contains(&addr) {
        return Err(FormulaError::CircularReference(name.to_string()));
    }
    // Every cell in progress is one link of the dependency chain
    if ctx.visited.len() >= ctx.max_depth {
        return Err(FormulaError::DepthExceeded(ctx.max_depth));
    }

    ctx.visited.insert(addr);
    let result = resolve_cell(name, addr, ctx);
    ctx.visited.remove(&addr);
    result
}

fn resolve_cell<G: GridAccessor + ?Sized>(
    name: &str,
    addr: CellAddress,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    if addr.row >= ctx.grid.row_count() || addr.col >= ctx.grid.column_count() {
        return Err(FormulaError::OutOfBounds(name.to_string()));
    }

    let grid = ctx.grid;
    match grid.stored_formula(addr.row, addr.col) {
        Some(formula) => {
            let ast: Arc<FormulaExpr> = ctx.cache.parse(formula);
            evaluate(&ast, ctx)
        }
        None => Ok(FormulaValue::Number(parse_raw_number(
            grid.raw_text(addr.row, addr.col),
        ))),
    }
}

/// Numeric value of a plain cell: empty, non-numeric or non-finite text is 0
fn parse_raw_number(text: &str) -> f64 {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Evaluate a range reference
///
/// A `#REF!` from any cell aborts the whole range; cells failing with any
/// other error are left out of the result.
fn evaluate_range<G: GridAccessor + ?Sized>(
    start: &str,
    end: &str,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    let first = ctx
        .cache
        .cell_indices(start)
        .ok_or_else(|| FormulaError::InvalidName(start.to_string()))?;
    let last = ctx
        .cache
        .cell_indices(end)
        .ok_or_else(|| FormulaError::InvalidName(end.to_string()))?;

    let mut values = Vec::new();
    for addr in CellRange::new(first, last).cells() {
        let name = addr.to_a1_string();
        match evaluate_cell(&name, addr, ctx) {
            Ok(FormulaValue::Number(n)) => values.push(n),
            Ok(FormulaValue::List(list)) => values.extend(list),
            Err(err) if err.cell_error() == CellError::Ref => return Err(err),
            Err(err) => {
                trace!(cell = %name, error = %err, "skipping range cell");
            }
        }
    }

    Ok(FormulaValue::List(values))
}

/// Evaluate a binary operation
fn evaluate_binary_op<G: GridAccessor + ?Sized>(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    // Evaluate operands first
    let l = evaluate(left, ctx)?.to_number()?;
    let r = evaluate(right, ctx)?.to_number()?;

    let result = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(FormulaError::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Power => {
            if l == 0.0 && r == 0.0 {
                return Err(FormulaError::ZeroToZeroPower);
            }
            l.powf(r)
        }
    };

    finite(result, op.symbol())
}

fn finite(result: f64, op: char) -> FormulaResult<FormulaValue> {
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Err(FormulaError::Arithmetic(format!(
            "'{}' produced a non-finite result",
            op
        )))
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op<G: GridAccessor + ?Sized>(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    let n = evaluate(operand, ctx)?.to_number()?;

    match op {
        UnaryOperator::Negate => finite(-n, '-'),
    }
}

/// Evaluate a function call
fn evaluate_function<G: GridAccessor + ?Sized>(
    name: &str,
    args: &[FormulaExpr],
    ctx: &mut EvaluationContext<'_, G>,
) -> FormulaResult<FormulaValue> {
    let func = functions::lookup(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Evaluate arguments, flattening ranges
    let mut values = Vec::with_capacity(args.len());
    for arg in args {
        match evaluate(arg, ctx)? {
            FormulaValue::Number(n) => values.push(n),
            FormulaValue::List(list) => values.extend(list),
        }
    }
    values.retain(|n| !n.is_nan());

    let result = (func.implementation)(&values);
    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Err(FormulaError::Arithmetic(format!(
            "{} produced a non-finite result",
            func.name
        )))
    }
}
