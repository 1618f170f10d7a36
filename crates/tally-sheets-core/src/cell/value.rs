//! Cell contents and error codes

use std::fmt;

/// Contents of one grid cell
///
/// `text` is what the host displays (or, for plain cells, the raw input).
/// `formula` is set only for formula cells and always starts with `=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellData {
    /// Displayed or raw text
    pub text: String,
    /// Stored formula, if this is a formula cell
    pub formula: Option<String>,
}

impl CellData {
    /// Create a plain text cell
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            formula: None,
        }
    }

    /// Create a formula cell whose display has not been calculated yet
    pub fn formula<S: Into<String>>(formula: S) -> Self {
        Self {
            text: String::new(),
            formula: Some(formula.into()),
        }
    }

    /// Check if the cell holds a formula
    pub fn is_formula(&self) -> bool {
        self.formula.is_some()
    }

    /// Check if the cell has neither text nor formula
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.formula.is_none()
    }
}

/// Formula error codes, displayed verbatim in place of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellError {
    /// #ERROR! - Malformed formula or generic evaluation failure
    Generic,
    /// #NAME? - Unresolvable cell or function name
    Name,
    /// #REF! - Out-of-bounds or invalidated reference
    Ref,
    /// #DIV/0! - Division by zero
    Div0,
    /// #NUM! - Zero raised to the zero power
    Num,
    /// #CIRCULAR! - A cell depends on itself
    Circular,
}

impl CellError {
    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Generic => "#ERROR!",
            CellError::Name => "#NAME?",
            CellError::Ref => "#REF!",
            CellError::Div0 => "#DIV/0!",
            CellError::Num => "#NUM!",
            CellError::Circular => "#CIRCULAR!",
        }
    }

    /// Parse an error string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#ERROR!" => Some(CellError::Generic),
            "#NAME?" => Some(CellError::Name),
            "#REF!" => Some(CellError::Ref),
            "#DIV/0!" => Some(CellError::Div0),
            "#NUM!" => Some(CellError::Num),
            "#CIRCULAR!" => Some(CellError::Circular),
            _ => None,
        }
    }

    /// All error codes, in display order
    pub fn all() -> [CellError; 6] {
        [
            CellError::Generic,
            CellError::Name,
            CellError::Ref,
            CellError::Div0,
            CellError::Num,
            CellError::Circular,
        ]
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
