//! Cell address and range types

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "AB12")
///
/// Column letters use the spreadsheet base-26 encoding (A..Z, AA..ZZ, AAA..)
/// and rows are 1-based in text. Both are stored 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., Z=25, AA=26)
    pub col: u32,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// The whole input must be one or more letters followed by one or more
    /// digits. Lowercase letters are accepted.
    ///
    /// # Examples
    /// ```
    /// use tally_sheets_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A1").unwrap();
    /// assert_eq!(addr.row, 0);
    /// assert_eq!(addr.col, 0);
    ///
    /// let addr = CellAddress::parse("AA10").unwrap();
    /// assert_eq!(addr.row, 9);
    /// assert_eq!(addr.col, 26);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }

        if pos == 0 {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }

        let col = Self::letters_to_column(&s[..pos])?;

        let row_str = &s[pos..];
        if row_str.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidAddress(format!(
                "invalid row number in '{}'",
                s
            )));
        }

        let row: u32 = row_str
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("row number too large in '{}'", s)))?;

        // Rows are 1-based in text, 0-based internally
        if row == 0 {
            return Err(Error::InvalidAddress(format!(
                "row number must be >= 1 in '{}'",
                s
            )));
        }

        Ok(Self { row: row - 1, col })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u32) -> String {
        let mut result = String::new();
        let mut n = col as u64 + 1; // 1-based for calculation

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u32> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u64 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
            if col > u32::MAX as u64 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' is too large",
                    letters
                )));
            }
        }

        Ok((col - 1) as u32)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        let mut result = Self::column_to_letters(self.col);
        result.push_str(&(self.row as u64 + 1).to_string());
        result
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A1:B10")
///
/// Corners are normalized on construction, so `B2:A1` and `A1:B2` are the
/// same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range from any two corners
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    /// Parse a range from A1:B10 notation
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => Ok(Self::new(
                CellAddress::parse(start)?,
                CellAddress::parse(end)?,
            )),
            None => {
                let addr = CellAddress::parse(s)?;
                Ok(Self::new(addr, addr))
            }
        }
    }

    /// Check if a row index falls within the range's row span
    pub fn spans_row(&self, row: u32) -> bool {
        row >= self.start.row && row <= self.end.row
    }

    /// Check if a column index falls within the range's column span
    pub fn spans_col(&self, col: u32) -> bool {
        col >= self.start.col && col <= self.end.col
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u64 {
        (self.end.row - self.start.row) as u64 + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u64 {
        (self.end.col - self.start.col) as u64 + 1
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row as u64,
            current_col: self.start.col as u64,
        }
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range, row-major
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u64,
    current_col: u64,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_row > self.range.end.row as u64 {
            return None;
        }

        let addr = CellAddress::new(self.current_row as u32, self.current_col as u32);

        // Move to next cell
        self.current_col += 1;
        if self.current_col > self.range.end.col as u64 {
            self.current_col = self.range.start.col as u64;
            self.current_row += 1;
        }

        Some(addr)
    }
}
