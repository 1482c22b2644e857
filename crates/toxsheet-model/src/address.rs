use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Largest column index a report template may address (`XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Largest row count a report template may address.
pub const MAX_ROWS: u32 = 1_048_576;

/// A worksheet column, stored **0-indexed** (`A` is `0`).
///
/// Serialized as its letter name so layout files stay readable (`"D"`, `"AA"`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(pub u32);

impl Column {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// 0-indexed column number.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Letter name of the column (`0 -> A`, `26 -> AA`).
    pub fn letters(self) -> String {
        let mut n = self.0 + 1;
        let mut out = Vec::<char>::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push(char::from(b'A' + rem as u8));
            n = (n - 1) / 26;
        }
        out.iter().rev().collect()
    }

    /// Parse a column letter name, case-insensitively.
    pub fn from_letters(s: &str) -> Result<Self, A1ParseError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(A1ParseError::MissingColumn);
        }
        let mut col: u32 = 0;
        for b in s.bytes() {
            if !b.is_ascii_alphabetic() {
                return Err(A1ParseError::InvalidColumn(s.to_string()));
            }
            let v = u32::from(b.to_ascii_uppercase() - b'A') + 1;
            col = col
                .checked_mul(26)
                .and_then(|c| c.checked_add(v))
                .ok_or_else(|| A1ParseError::InvalidColumn(s.to_string()))?;
        }
        if col > MAX_COLS {
            return Err(A1ParseError::InvalidColumn(s.to_string()));
        }
        Ok(Self(col - 1))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.letters())
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Column::from_letters(&raw).map_err(serde::de::Error::custom)
    }
}

/// A single cell coordinate. Rows and columns are **0-indexed**, so `A1` is `(0, 0)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Build from the 1-based row number shown in spreadsheet UIs and a column.
    #[inline]
    pub const fn at(row_1_based: u32, col: Column) -> Self {
        Self::new(row_1_based - 1, col.0)
    }

    #[inline]
    pub const fn column(self) -> Column {
        Column(self.col)
    }

    pub fn to_a1(self) -> String {
        format!("{}{}", self.column().letters(), self.row + 1)
    }

    /// Parse `B7` / `$B$7` style references.
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }
        let s = s.strip_prefix('$').unwrap_or(s);
        let split = s
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or(A1ParseError::MissingRow)?;
        let (letters, rest) = s.split_at(split);
        let col = Column::from_letters(letters)?;
        let digits = rest.strip_prefix('$').unwrap_or(rest);
        if digits.is_empty() {
            return Err(A1ParseError::MissingRow);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(A1ParseError::TrailingCharacters(a1.trim().to_string()));
        }
        let row: u32 = digits
            .parse()
            .map_err(|_| A1ParseError::InvalidRow(digits.to_string()))?;
        if row == 0 || row > MAX_ROWS {
            return Err(A1ParseError::InvalidRow(digits.to_string()));
        }
        Ok(Self::new(row - 1, col.0))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

impl Serialize for CellRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_a1())
    }
}

impl<'de> Deserialize<'de> for CellRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        CellRef::from_a1(&raw).map_err(serde::de::Error::custom)
    }
}

/// An inclusive rectangle of cells, always normalized so `start` is the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    pub const fn new(a: CellRef, b: CellRef) -> Self {
        let (r0, r1) = if a.row <= b.row { (a.row, b.row) } else { (b.row, a.row) };
        let (c0, c1) = if a.col <= b.col { (a.col, b.col) } else { (b.col, a.col) };
        Self {
            start: CellRef::new(r0, c0),
            end: CellRef::new(r1, c1),
        }
    }

    #[inline]
    pub const fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    pub const fn intersects(&self, other: &Range) -> bool {
        self.start.row <= other.end.row
            && other.start.row <= self.end.row
            && self.start.col <= other.end.col
            && other.start.col <= self.end.col
    }

    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Row-major iteration over every cell in the range.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col)))
    }

    /// Parse `A1:B2` or a single `C3`.
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }
        match s.split_once(':') {
            None => {
                let cell = CellRef::from_a1(s)?;
                Ok(Range::new(cell, cell))
            }
            Some((a, b)) => Ok(Range::new(CellRef::from_a1(a)?, CellRef::from_a1(b)?)),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Range::from_a1(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum A1ParseError {
    #[error("empty A1 reference")]
    Empty,
    #[error("missing column in A1 reference")]
    MissingColumn,
    #[error("missing row in A1 reference")]
    MissingRow,
    #[error("invalid column `{0}`")]
    InvalidColumn(String),
    #[error("invalid row `{0}`")]
    InvalidRow(String),
    #[error("trailing characters in A1 reference `{0}`")]
    TrailingCharacters(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_roundtrip() {
        let c = CellRef::new(6, 2);
        assert_eq!(c.to_a1(), "C7");
        assert_eq!(CellRef::from_a1("C7").unwrap(), c);
        assert_eq!(CellRef::from_a1("$c$7").unwrap(), c);
        assert_eq!(CellRef::at(7, Column::from_letters("C").unwrap()), c);
    }

    #[test]
    fn column_letters() {
        assert_eq!(Column::new(0).letters(), "A");
        assert_eq!(Column::new(18).letters(), "S");
        assert_eq!(Column::new(26).letters(), "AA");
        assert_eq!(Column::from_letters("aa").unwrap(), Column::new(26));
        assert!(Column::from_letters("A1").is_err());
        assert!(Column::from_letters("XFE").is_err());
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!(CellRef::from_a1(""), Err(A1ParseError::Empty));
        assert_eq!(CellRef::from_a1("B"), Err(A1ParseError::MissingRow));
        assert!(CellRef::from_a1("B0").is_err());
        assert!(CellRef::from_a1("B7x").is_err());
    }

    #[test]
    fn range_normalizes_and_iterates() {
        let r = Range::from_a1("C3:B2").unwrap();
        assert_eq!(r.start, CellRef::new(1, 1));
        assert_eq!(r.end, CellRef::new(2, 2));
        let cells: Vec<String> = r.cells().map(CellRef::to_a1).collect();
        assert_eq!(cells, vec!["B2", "C2", "B3", "C3"]);
        assert!(r.intersects(&Range::from_a1("C3:D4").unwrap()));
        assert!(!r.intersects(&Range::from_a1("D4").unwrap()));
    }
}
