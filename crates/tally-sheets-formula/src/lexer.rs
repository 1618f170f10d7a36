//! Formula lexer
//!
//! Turns the body of a formula into a flat token list. The text is
//! upper-cased and its leading `=` removed before scanning, so token payloads
//! are always upper-case.

use crate::error::{FormulaError, FormulaResult};

/// Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    RefError,
    NameError,

    // Identifiers and references
    Function(String), // Identifier immediately followed by '('
    Cell(String),     // Letters followed by digits, e.g. A1

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Colon,
    Comma,

    // Delimiters
    LeftParen,
    RightParen,
}

/// Tokenize formula text
///
/// Fails on the first character that starts no token. A stray `#` that is
/// not the last character is skipped.
///
/// # Example
/// ```rust
/// use tally_sheets_formula::lexer::{tokenize, Token};
///
/// let tokens = tokenize("=sum(a1:b2)").unwrap();
/// assert_eq!(tokens[0], Token::Function("SUM".into()));
/// assert_eq!(tokens[2], Token::Cell("A1".into()));
/// ```
pub fn tokenize(text: &str) -> FormulaResult<Vec<Token>> {
    let body = text.trim_start_matches('=').to_uppercase();
    Lexer::new(&body).run()
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn run(mut self) -> FormulaResult<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> FormulaResult<Option<Token>> {
        loop {
            let c = match self.peek_char() {
                Some(c) => c,
                None => return Ok(None),
            };

            if c.is_ascii_digit() {
                return self.scan_number().map(Some);
            }

            if c == '#' {
                if let Some(token) = self.scan_error_literal() {
                    return Ok(Some(token));
                }
                // Stray '#': tolerated unless it ends the input
                if self.input.len() > self.pos + 1 {
                    self.advance();
                    continue;
                }
                return Err(self.unrecognized(c));
            }

            if c.is_ascii_uppercase() || c == '_' {
                return self.scan_identifier_or_cell().map(Some);
            }

            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '^' => Token::Caret,
                '(' => Token::LeftParen,
                ')' => Token::RightParen,
                ',' => Token::Comma,
                ':' => Token::Colon,
                ' ' | '\t' => {
                    self.advance();
                    continue;
                }
                _ => return Err(self.unrecognized(c)),
            };
            self.advance();
            return Ok(Some(token));
        }
    }

    fn scan_number(&mut self) -> FormulaResult<Token> {
        let start = self.pos;

        // Integer part
        self.skip_while(|c| c.is_ascii_digit());

        // Decimal part (digits after the point are optional)
        if self.peek_char() == Some('.') {
            self.advance();
            self.skip_while(|c| c.is_ascii_digit());
        }

        let num_str = &self.input[start..self.pos];
        match num_str.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(Token::Number(n)),
            Ok(_) => Err(FormulaError::Parse(format!(
                "Number '{}' is too large",
                num_str
            ))),
            Err(_) => Err(FormulaError::Parse(format!("Invalid number '{}'", num_str))),
        }
    }

    fn scan_error_literal(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos..];
        let (token, len) = if rest.starts_with("#REF!") {
            (Token::RefError, "#REF!".len())
        } else if rest.starts_with("#NAME?") {
            (Token::NameError, "#NAME?".len())
        } else {
            return None;
        };
        self.pos += len;
        Some(token)
    }

    fn scan_identifier_or_cell(&mut self) -> FormulaResult<Token> {
        let start = self.pos;
        let rest = &self.input[start..];

        // Function name: letters/underscores directly followed by '('
        let ident_len = rest
            .find(|c: char| !(c.is_ascii_uppercase() || c == '_'))
            .unwrap_or(rest.len());
        if ident_len > 0 && rest[ident_len..].starts_with('(') {
            self.pos += ident_len;
            return Ok(Token::Function(rest[..ident_len].to_string()));
        }

        // Cell reference: letters followed by digits
        let letters = rest
            .find(|c: char| !c.is_ascii_uppercase())
            .unwrap_or(rest.len());
        let digits = rest[letters..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - letters);
        if letters > 0 && digits > 0 {
            self.pos += letters + digits;
            return Ok(Token::Cell(rest[..letters + digits].to_string()));
        }

        Err(self.unrecognized(rest.chars().next().unwrap_or('_')))
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek_char().map_or(false, &pred) {
            self.advance();
        }
    }

    fn unrecognized(&self, ch: char) -> FormulaError {
        FormulaError::Lex {
            ch,
            position: self.pos,
        }
    }
}
