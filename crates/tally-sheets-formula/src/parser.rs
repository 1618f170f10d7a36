//! Formula parser
//!
//! A recursive descent parser over the lexer's tokens with four precedence
//! tiers (lowest to highest): additive, multiplicative, power, primary.

use crate::ast::{BinaryOperator, FormulaExpr};
use crate::error::{FormulaError, FormulaResult};
use crate::lexer::{tokenize, Token};
use tally_sheets_core::CellError;

/// Deepest nesting accepted before the formula is rejected as malformed
///
/// Parentheses, calls, unary minus, `^` and every operator in a run of
/// `+ - * /` each count as one level.
pub const MAX_NESTING: usize = 256;

/// Parse a formula string into an AST
///
/// Input that does not start with `=` is not a formula and is rejected
/// before tokenizing. Lexer failures are returned as [`FormulaError::Lex`] and
/// any syntactic failure as [`FormulaError::Parse`].
///
/// # Example
/// ```rust
/// use tally_sheets_formula::parse_formula;
///
/// let ast = parse_formula("=1+2").unwrap();
/// let ast = parse_formula("=SUM(A1:A10)").unwrap();
/// assert_eq!(ast.to_text(), "SUM(A1:A10)");
/// ```
pub fn parse_formula(formula: &str) -> FormulaResult<FormulaExpr> {
    if !formula.starts_with('=') {
        return Err(FormulaError::Parse("Formula must start with '='".into()));
    }

    let tokens = tokenize(formula)?;

    // A bare '=' is zero
    if tokens.is_empty() {
        return Ok(FormulaExpr::Number(0.0));
    }

    let mut parser = FormulaParser::new(tokens);
    let expr = parser.parse_expression()?;

    // Make sure we consumed all input
    if let Some(token) = parser.current_token() {
        return Err(FormulaError::Parse(format!(
            "Unexpected token after expression: {:?}",
            token
        )));
    }

    Ok(expr)
}

/// Formula parser
struct FormulaParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl FormulaParser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // === Helper methods ===

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> FormulaResult<()> {
        match self.current_token() {
            Some(token) if token == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(token) => Err(FormulaError::Parse(format!(
                "Expected {:?}, got {:?}",
                expected, token
            ))),
            None => Err(FormulaError::Parse(format!(
                "Expected {:?}, got end of formula",
                expected
            ))),
        }
    }

    fn enter(&mut self) -> FormulaResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(FormulaError::Parse(format!(
                "Formula nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    // === Expression parsing with precedence ===

    fn parse_expression(&mut self) -> FormulaResult<FormulaExpr> {
        self.enter()?;
        let expr = self.parse_additive();
        self.leave();
        expr
    }

    fn parse_additive(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_chain(Self::parse_multiplicative, |token| match token {
            Token::Plus => Some(BinaryOperator::Add),
            Token::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> FormulaResult<FormulaExpr> {
        self.parse_chain(Self::parse_power, |token| match token {
            Token::Star => Some(BinaryOperator::Multiply),
            Token::Slash => Some(BinaryOperator::Divide),
            _ => None,
        })
    }

    /// Parse a left-associative run `operand (op operand)*`
    ///
    /// Each operator deepens the tree by one level, so each one counts
    /// against the nesting limit until the run ends.
    fn parse_chain(
        &mut self,
        operand: fn(&mut Self) -> FormulaResult<FormulaExpr>,
        operator: fn(&Token) -> Option<BinaryOperator>,
    ) -> FormulaResult<FormulaExpr> {
        let base = self.depth;
        let result = self.parse_chain_terms(operand, operator);
        self.depth = base;
        result
    }

    fn parse_chain_terms(
        &mut self,
        operand: fn(&mut Self) -> FormulaResult<FormulaExpr>,
        operator: fn(&Token) -> Option<BinaryOperator>,
    ) -> FormulaResult<FormulaExpr> {
        let mut left = operand(self)?;

        while let Some(op) = self.current_token().and_then(operator) {
            self.consume();
            self.enter()?;
            let right = operand(self)?;
            left = FormulaExpr::binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_power(&mut self) -> FormulaResult<FormulaExpr> {
        let left = self.parse_primary()?;

        if matches!(self.current_token(), Some(Token::Caret)) {
            self.consume();
            self.enter()?;
            let right = self.parse_power(); // Right associative
            self.leave();
            return Ok(FormulaExpr::binary(BinaryOperator::Power, left, right?));
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> FormulaResult<FormulaExpr> {
        let token = self
            .consume()
            .ok_or_else(|| FormulaError::Parse("Unexpected end of formula".into()))?;

        match token {
            Token::RefError => Ok(FormulaExpr::Error(CellError::Ref)),
            Token::NameError => Ok(FormulaExpr::Error(CellError::Name)),

            Token::Number(n) => Ok(FormulaExpr::Number(n)),

            Token::Minus => {
                self.enter()?;
                let operand = self.parse_power();
                self.leave();
                Ok(FormulaExpr::negate(operand?))
            }

            Token::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RightParen)?;
                Ok(expr)
            }

            Token::Cell(start) => {
                if !matches!(self.current_token(), Some(Token::Colon)) {
                    return Ok(FormulaExpr::CellRef(start));
                }
                self.consume();
                match self.consume() {
                    Some(Token::Cell(end)) => Ok(FormulaExpr::RangeRef { start, end }),
                    other => Err(FormulaError::Parse(format!(
                        "Expected cell after ':', got {:?}",
                        other
                    ))),
                }
            }

            Token::Function(name) => self.parse_function_call(name),

            other => Err(FormulaError::Parse(format!(
                "Unexpected token: {:?}",
                other
            ))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> FormulaResult<FormulaExpr> {
        self.expect(&Token::LeftParen)?;

        let mut args = Vec::new();

        // Parse arguments
        if !matches!(self.current_token(), Some(Token::RightParen)) {
            args.push(self.parse_expression()?);

            while matches!(self.current_token(), Some(Token::Comma)) {
                self.consume();
                args.push(self.parse_expression()?);
            }
        }

        self.expect(&Token::RightParen)?;

        Ok(FormulaExpr::Function { name, args })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cell(name: &str) -> FormulaExpr {
        FormulaExpr::CellRef(name.into())
    }

    fn num(n: f64) -> FormulaExpr {
        FormulaExpr::Number(n)
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_formula("=42").unwrap(), num(42.0));
        assert_eq!(parse_formula("=3.14").unwrap(), num(3.14));
    }

    #[test]
    fn test_requires_equals_sign() {
        assert!(matches!(
            parse_formula("1+2"),
            Err(FormulaError::Parse(_))
        ));
        assert!(parse_formula(" =1").is_err());
    }

    #[test]
    fn test_empty_formula_is_zero() {
        assert_eq!(parse_formula("=").unwrap(), num(0.0));
    }

    #[test]
    fn test_parse_precedence() {
        // 1+(2*3)
        assert_eq!(
            parse_formula("=1+2*3").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Add,
                num(1.0),
                FormulaExpr::binary(BinaryOperator::Multiply, num(2.0), num(3.0)),
            )
        );

        // Left associative: (10-4)-3
        assert_eq!(
            parse_formula("=10-4-3").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Subtract,
                FormulaExpr::binary(BinaryOperator::Subtract, num(10.0), num(4.0)),
                num(3.0),
            )
        );
    }

    #[test]
    fn test_power_is_right_associative() {
        assert_eq!(
            parse_formula("=2^2^3").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Power,
                num(2.0),
                FormulaExpr::binary(BinaryOperator::Power, num(2.0), num(3.0)),
            )
        );
    }

    #[test]
    fn test_unary_minus_binds_to_power() {
        // -(2^2), not (-2)^2
        assert_eq!(
            parse_formula("=-2^2").unwrap(),
            FormulaExpr::negate(FormulaExpr::binary(
                BinaryOperator::Power,
                num(2.0),
                num(2.0)
            ))
        );
        assert_eq!(
            parse_formula("=3*-A1").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Multiply,
                num(3.0),
                FormulaExpr::negate(cell("A1"))
            )
        );
        assert_eq!(
            parse_formula("=--1").unwrap(),
            FormulaExpr::negate(FormulaExpr::negate(num(1.0)))
        );
    }

    #[test]
    fn test_parse_parentheses() {
        assert_eq!(
            parse_formula("=(1+2)*3").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Multiply,
                FormulaExpr::binary(BinaryOperator::Add, num(1.0), num(2.0)),
                num(3.0),
            )
        );
    }

    #[test]
    fn test_parse_references() {
        assert_eq!(parse_formula("=a1").unwrap(), cell("A1"));
        assert_eq!(
            parse_formula("=B2:A1").unwrap(),
            FormulaExpr::range("B2", "A1")
        );
        assert!(parse_formula("=A1:").is_err());
        assert!(parse_formula("=A1:5").is_err());
    }

    #[test]
    fn test_parse_function() {
        assert_eq!(
            parse_formula("=SUM(A1:B2, 5, C3)").unwrap(),
            FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![FormulaExpr::range("A1", "B2"), num(5.0), cell("C3")],
            }
        );
        assert_eq!(
            parse_formula("=MAX()").unwrap(),
            FormulaExpr::Function {
                name: "MAX".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn test_unknown_function_is_structurally_valid() {
        assert_eq!(
            parse_formula("=FOO(1)").unwrap(),
            FormulaExpr::Function {
                name: "FOO".into(),
                args: vec![num(1.0)],
            }
        );
    }

    #[test]
    fn test_nested_function() {
        let ast = parse_formula("=SUM(MAX(A1,B1),MIN(1,2)*2)").unwrap();
        if let FormulaExpr::Function { name, args } = ast {
            assert_eq!(name, "SUM");
            assert_eq!(args.len(), 2);
            assert!(matches!(&args[1], FormulaExpr::BinaryOp { .. }));
        } else {
            panic!("Expected Function");
        }
    }

    #[test]
    fn test_parse_error_literals() {
        assert_eq!(
            parse_formula("=#REF!").unwrap(),
            FormulaExpr::Error(CellError::Ref)
        );
        assert_eq!(
            parse_formula("=#REF!+A1").unwrap(),
            FormulaExpr::binary(
                BinaryOperator::Add,
                FormulaExpr::Error(CellError::Ref),
                cell("A1")
            )
        );
        assert_eq!(
            parse_formula("=SUM(#NAME?)").unwrap(),
            FormulaExpr::Function {
                name: "SUM".into(),
                args: vec![FormulaExpr::Error(CellError::Name)],
            }
        );
    }

    #[test]
    fn test_lex_failure_propagates() {
        assert_eq!(
            parse_formula("=A1&B1"),
            Err(FormulaError::Lex {
                ch: '&',
                position: 2
            })
        );
    }

    #[test]
    fn test_syntax_errors() {
        for formula in ["=1+", "=(1+2", "=1+2)", "=SUM(1,", "=SUM(1 2)", "=*3", "=1 2", "=,"] {
            assert!(
                matches!(parse_formula(formula), Err(FormulaError::Parse(_))),
                "expected parse error for {}",
                formula
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("={}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        assert!(parse_formula(&deep).is_err());

        let shallow = format!("={}1{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(parse_formula(&shallow).unwrap(), num(1.0));

        let negations = format!("={}1", "-".repeat(MAX_NESTING + 1));
        assert!(parse_formula(&negations).is_err());
    }

    #[test]
    fn test_operator_runs_count_toward_nesting() {
        let long_sum = format!("=A2{}", "+1".repeat(10_000));
        assert!(matches!(parse_formula(&long_sum), Err(FormulaError::Parse(_))));

        let long_product = format!("=2{}", "*1".repeat(MAX_NESTING));
        assert!(matches!(parse_formula(&long_product), Err(FormulaError::Parse(_))));

        let sum = format!("=A2{}", "+1".repeat(200));
        let ast = parse_formula(&sum).unwrap();
        assert_eq!(ast.to_text().matches('+').count(), 200);

        // A run ends at its closing parenthesis
        let grouped = format!("=({})+({})", "1+".repeat(150) + "1", "1+".repeat(150) + "1");
        assert!(parse_formula(&grouped).is_ok());
    }
}
