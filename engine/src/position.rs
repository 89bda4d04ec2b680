//! FILENAME: engine/src/position.rs
//! PURPOSE: Grid coordinates for a spreadsheet cell: row/column pair, A1-style
//! label conversion, and the valid-range check every Sheet entrypoint guards on.
//! CONTEXT: 0-based (row, col) internally; displayed as 1-based row plus a
//! base-26 column label ("A".."Z", "AA".."ZZ", ...), matching the teacher's
//! `coord.rs` conversion functions, generalized into a first-class type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exclusive upper bound on row indices: `0 <= row < MAX_ROWS`.
pub const MAX_ROWS: u32 = 16384;
/// Exclusive upper bound on column indices: `0 <= col < MAX_COLS`.
pub const MAX_COLS: u32 = 16384;

/// A 0-based `(row, col)` grid coordinate.
///
/// Field declaration order (`row` then `col`) is load-bearing: the derived
/// `Ord`/`PartialOrd` give exactly the lexicographic-by-`(row, col)` order
/// spec requires, with no custom `Ord` impl needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: u32,
    pub col: u32,
}

/// The one error this crate's public API surfaces for a malformed coordinate,
/// whether it came from a bad A1 label or from out-of-range numeric indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPosition;

impl fmt::Display for InvalidPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid position")
    }
}

impl std::error::Error for InvalidPosition {}

impl Position {
    pub fn new(row: u32, col: u32) -> Self {
        Position { row, col }
    }

    /// `true` iff both components are within `[0, MAX_ROWS)` / `[0, MAX_COLS)`.
    pub fn is_valid(&self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Builds a position from A1-style column letters plus a 1-based row
    /// number, as produced by the formula parser's `CellRef`. The row/col
    /// magnitude is computed with `u64` arithmetic and saturated into `u32`
    /// so a pathologically long column label degrades to an out-of-range
    /// (and therefore invalid, never panicking) `Position` instead of
    /// overflowing.
    pub fn from_label_parts(col: &str, row_1based: u32) -> Self {
        let col_index = col_label_to_index(col);
        let row = row_1based.saturating_sub(1);
        Position { row, col: col_index }
    }

    /// Parses a standalone A1-style label such as `"A1"` or `"ZZ100"`.
    /// Fails with `InvalidPosition` if the label doesn't have the shape
    /// `letters+ digits+`, or resolves outside the valid range.
    pub fn from_string(s: &str) -> Result<Self, InvalidPosition> {
        let split_at = s.find(|c: char| !c.is_ascii_alphabetic()).ok_or(InvalidPosition)?;
        let (col, row_str) = s.split_at(split_at);
        if col.is_empty() || row_str.is_empty() {
            return Err(InvalidPosition);
        }
        if !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidPosition);
        }
        let row_1based: u32 = row_str.parse().map_err(|_| InvalidPosition)?;
        if row_1based == 0 {
            return Err(InvalidPosition);
        }
        let pos = Position::from_label_parts(col, row_1based);
        if pos.is_valid() {
            Ok(pos)
        } else {
            Err(InvalidPosition)
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_index_to_label(self.col), self.row + 1)
    }
}

/// Converts a column label (e.g. `"A"`, `"AA"`, case-insensitive) to a
/// 0-based column index, saturating on overflow rather than panicking.
fn col_label_to_index(col: &str) -> u32 {
    let mut acc: u64 = 0;
    for c in col.chars() {
        let digit = (c.to_ascii_uppercase() as u64) - ('A' as u64) + 1;
        acc = acc.saturating_mul(26).saturating_add(digit);
        if acc > u64::from(u32::MAX) + 1 {
            return u32::MAX;
        }
    }
    (acc.saturating_sub(1)).min(u64::from(u32::MAX)) as u32
}

/// Converts a 0-based column index back to its base-26 label.
fn col_index_to_label(mut col: u32) -> String {
    let mut out = String::new();
    loop {
        let remainder = col % 26;
        out.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_labels() {
        for (label, row, col) in [("A", 1u32, 0u32), ("Z", 50, 25), ("AA", 100, 26), ("ZZ", 1, 701)] {
            let pos = Position::from_label_parts(label, row);
            assert_eq!(pos, Position::new(row - 1, col));
            assert_eq!(Position::from_string(&format!("{}{}", label, row)).unwrap(), pos);
            assert_eq!(pos.to_string(), format!("{}{}", label, row));
        }
    }

    #[test]
    fn ordering_is_lexicographic_row_then_col() {
        assert!(Position::new(0, 5) < Position::new(1, 0));
        assert!(Position::new(2, 0) < Position::new(2, 1));
    }

    #[test]
    fn boundary_positions_are_valid() {
        assert!(Position::new(0, 0).is_valid());
        assert!(Position::new(MAX_ROWS - 1, MAX_COLS - 1).is_valid());
        assert!(!Position::new(MAX_ROWS, 0).is_valid());
        assert!(!Position::new(0, MAX_COLS).is_valid());
    }

    #[test]
    fn from_string_rejects_malformed_labels() {
        assert!(Position::from_string("").is_err());
        assert!(Position::from_string("1A").is_err());
        assert!(Position::from_string("A").is_err());
        assert!(Position::from_string("A0").is_err());
        assert!(Position::from_string("A-1").is_err());
    }

    #[test]
    fn from_string_rejects_out_of_range() {
        // One row beyond MAX_ROWS.
        assert!(Position::from_string("A16385").is_err());
    }
}
