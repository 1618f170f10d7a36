//! Formula Abstract Syntax Tree types

use std::fmt;
use tally_sheets_core::CellError;

/// Formula expression AST
///
/// Every node owns its children; a tree is built fresh by each parse and is
/// never mutated afterwards. A tree whose root is not [`FormulaExpr::Error`]
/// is syntactically well-formed.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// Error literal (malformed input, or a reference invalidated by an edit)
    Error(CellError),

    // === References ===
    /// Single cell reference, upper-cased (e.g. "A1")
    CellRef(String),
    /// Range reference; corners may be given in either order
    RangeRef { start: String, end: String },

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function { name: String, args: Vec<FormulaExpr> },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
}

impl BinaryOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(&self) -> char {
        match self {
            BinaryOperator::Add => '+',
            BinaryOperator::Subtract => '-',
            BinaryOperator::Multiply => '*',
            BinaryOperator::Divide => '/',
            BinaryOperator::Power => '^',
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl UnaryOperator {
    /// Operator symbol as written in formulas
    pub fn symbol(&self) -> char {
        match self {
            UnaryOperator::Negate => '-',
        }
    }
}

impl FormulaExpr {
    /// Build a binary operation node
    pub fn binary(op: BinaryOperator, left: FormulaExpr, right: FormulaExpr) -> Self {
        FormulaExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Build a negation node
    pub fn negate(operand: FormulaExpr) -> Self {
        FormulaExpr::UnaryOp {
            op: UnaryOperator::Negate,
            operand: Box::new(operand),
        }
    }

    /// Build a range node
    pub fn range<S: Into<String>>(start: S, end: S) -> Self {
        FormulaExpr::RangeRef {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Check if this node is an error literal
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaExpr::Error(_))
    }

    /// Render the formula body (without the leading `=`)
    ///
    /// Re-parsing `"=" + expr.to_text()` yields a tree that evaluates the
    /// same way. Operands that are binary operations are parenthesized, as is
    /// a negation used as the base of `^`.
    pub fn to_text(&self) -> String {
        match self {
            FormulaExpr::Number(n) => format!("{}", n),
            FormulaExpr::Error(e) => e.as_str().to_string(),
            FormulaExpr::CellRef(name) => name.clone(),
            FormulaExpr::RangeRef { start, end } => format!("{}:{}", start, end),
            FormulaExpr::BinaryOp { op, left, right } => {
                let wrap_left = matches!(**left, FormulaExpr::BinaryOp { .. })
                    || (*op == BinaryOperator::Power
                        && matches!(**left, FormulaExpr::UnaryOp { .. }));
                format!(
                    "{}{}{}",
                    operand_text(left, wrap_left),
                    op.symbol(),
                    operand_text(right, matches!(**right, FormulaExpr::BinaryOp { .. }))
                )
            }
            FormulaExpr::UnaryOp { op, operand } => format!(
                "{}{}",
                op.symbol(),
                operand_text(operand, matches!(**operand, FormulaExpr::BinaryOp { .. }))
            ),
            FormulaExpr::Function { name, args } => {
                let args: Vec<String> = args.iter().map(FormulaExpr::to_text).collect();
                format!("{}({})", name, args.join(","))
            }
        }
    }
}

fn operand_text(expr: &FormulaExpr, parenthesize: bool) -> String {
    if parenthesize {
        format!("({})", expr.to_text())
    } else {
        expr.to_text()
    }
}

impl fmt::Display for FormulaExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
