//! FILENAME: engine/src/value.rs
//! PURPOSE: The tagged result of a cell: a number, text, or one of the three
//! formula-error categories, plus the `#TOKEN!` rendering used on output.
//! CONTEXT: Grounded on `original_source/spreadsheet/common.h`'s
//! `CellInterface::Value` variant and `FormulaError::Category`; the teacher's
//! own `CellValue` (core/engine/src/cell.rs) has extra variants (`Empty`,
//! `Boolean`) and extra error categories this spec doesn't carry, so this is
//! a fresh, narrower tagged union rather than a copy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three formula-error categories spec.md §4.3/§4.7 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellError {
    /// Division by zero, overflow, or any other unclassified arithmetic fault.
    Arithmetic,
    /// A referenced cell's text doesn't parse as a finite number.
    Value,
    /// A referenced position is out of the valid `Position` range.
    Ref,
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            CellError::Arithmetic => "#ARITHM!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
        };
        write!(f, "{}", token)
    }
}

/// A cell's computed (or directly derived) result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Text(String),
    Error(CellError),
}

impl Value {
    /// The empty cell's value: empty text.
    pub fn empty() -> Self {
        Value::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Error(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_tokens_match_spec() {
        assert_eq!(CellError::Arithmetic.to_string(), "#ARITHM!");
        assert_eq!(CellError::Value.to_string(), "#VALUE!");
        assert_eq!(CellError::Ref.to_string(), "#REF!");
    }

    #[test]
    fn empty_value_is_empty_text() {
        assert_eq!(Value::empty(), Value::Text(String::new()));
    }

    #[test]
    fn number_formats_with_default_float_display() {
        assert_eq!(Value::Number(5.0).to_string(), "5");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
    }
}
