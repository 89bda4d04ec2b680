//! FILENAME: engine/src/lib.rs
//! PURPOSE: Library root for the spreadsheet core engine.
//! CONTEXT: Re-exports the public surface spec.md §6 names: `Position`,
//! `Value`/`CellError`, `CellBody`, `Sheet`/`CellHandle`, and the three
//! exception kinds a mutation can raise. `formula` (a sibling crate) is the
//! "external collaborator" from spec.md §4.3; this crate is the actual
//! subject of spec.md §1-§9.

pub mod body;
pub mod cell;
pub mod error;
mod eval;
pub mod position;
pub mod sheet;
pub mod value;

pub use body::CellBody;
pub use cell::Cell;
pub use error::{CircularDependency, FormulaException, InvalidPosition, SetCellError};
pub use position::{Position, MAX_COLS, MAX_ROWS};
pub use sheet::{CellHandle, Sheet};
pub use value::{CellError, Value};

/// Constructs a new, empty sheet (spec.md §6: `create_sheet() -> Sheet`).
pub fn create_sheet() -> Sheet {
    Sheet::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(label: &str) -> Position {
        Position::from_string(label).unwrap()
    }

    /// Scenario 1 (spec.md §8): basic arithmetic.
    #[test]
    fn scenario_arithmetic() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("A2"), "3").unwrap();
        sheet.set_cell(pos("A3"), "=A1+A2").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A3")).unwrap().unwrap().get_value(),
            Value::Number(5.0)
        );
    }

    /// Scenario 2: transitive recompute after an upstream write.
    #[test]
    fn scenario_transitive_recompute() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "2").unwrap();
        sheet.set_cell(pos("A2"), "3").unwrap();
        sheet.set_cell(pos("A3"), "=A1+A2").unwrap();
        sheet.set_cell(pos("A1"), "10").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A3")).unwrap().unwrap().get_value(),
            Value::Number(13.0)
        );
    }

    /// Scenario 3: escaped text.
    #[test]
    fn scenario_escaped_text() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("B1"), "'=not formula").unwrap();
        let handle = sheet.get_cell(pos("B1")).unwrap().unwrap();
        assert_eq!(handle.get_text(), "'=not formula");
        assert_eq!(handle.get_value(), Value::Text("=not formula".to_string()));
    }

    /// Scenario 4: a cycle is rejected and leaves the target unchanged.
    #[test]
    fn scenario_cycle_rejection() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("B1"), "=C1").unwrap();
        let err = sheet.set_cell(pos("C1"), "=A1").unwrap_err();
        assert!(matches!(err, SetCellError::CircularDependency(_)));
        assert!(sheet.get_cell(pos("C1")).unwrap().is_none());
    }

    /// Scenario 5: a text-valued reference is a Value error until cleared.
    #[test]
    fn scenario_ref_error_then_recovery() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "=B1").unwrap();
        sheet.set_cell(pos("B1"), "hello").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A1")).unwrap().unwrap().get_value(),
            Value::Error(CellError::Value)
        );
        sheet.set_cell(pos("B1"), "").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A1")).unwrap().unwrap().get_value(),
            Value::Number(0.0)
        );
    }

    /// Scenario 6: printable size grows and shrinks with occupancy.
    #[test]
    fn scenario_printable_size() {
        let mut sheet = create_sheet();
        sheet.set_cell(Position::new(1, 2), "x").unwrap();
        assert_eq!(sheet.printable_size(), (2, 3));
        sheet.clear_cell(Position::new(1, 2)).unwrap();
        assert_eq!(sheet.printable_size(), (0, 0));
    }

    /// Boundary cases: (0,0) and (MAX_ROWS-1, MAX_COLS-1) accepted, one
    /// beyond rejected.
    #[test]
    fn boundary_positions() {
        let mut sheet = create_sheet();
        assert!(sheet.set_cell(Position::new(0, 0), "1").is_ok());
        assert!(sheet
            .set_cell(Position::new(MAX_ROWS - 1, MAX_COLS - 1), "1")
            .is_ok());
        assert!(matches!(
            sheet.set_cell(Position::new(MAX_ROWS, 0), "1"),
            Err(SetCellError::InvalidPosition(_))
        ));
        assert!(matches!(
            sheet.set_cell(Position::new(0, MAX_COLS), "1"),
            Err(SetCellError::InvalidPosition(_))
        ));
    }

    /// Round-trip/idempotence: rewriting a cell with its own current text is
    /// a no-op (observably identical state).
    #[test]
    fn rewrite_with_own_text_is_idempotent() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "=1+2").unwrap();
        let text = sheet.get_cell(pos("A1")).unwrap().unwrap().get_text();
        sheet.set_cell(pos("A1"), &text).unwrap();
        assert_eq!(sheet.get_cell(pos("A1")).unwrap().unwrap().get_text(), text);
        assert_eq!(
            sheet.get_cell(pos("A1")).unwrap().unwrap().get_value(),
            Value::Number(3.0)
        );
    }

    /// Clearing then rewriting the same text reproduces the same value.
    #[test]
    fn clear_then_rewrite_reproduces_value() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "5").unwrap();
        sheet.set_cell(pos("A2"), "=A1*2").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A2")).unwrap().unwrap().get_value(),
            Value::Number(10.0)
        );
        sheet.clear_cell(pos("A2")).unwrap();
        sheet.set_cell(pos("A2"), "=A1*2").unwrap();
        assert_eq!(
            sheet.get_cell(pos("A2")).unwrap().unwrap().get_value(),
            Value::Number(10.0)
        );
    }

    /// Invariant: every `A.reverse` entry points back at a cell whose
    /// forward set contains `A`.
    #[test]
    fn reverse_edges_are_consistent_with_forward_edges() {
        let mut sheet = create_sheet();
        sheet.set_cell(pos("A1"), "=B1+C1").unwrap();
        for label in ["B1", "C1"] {
            let referenced = sheet.get_cell(pos(label)).unwrap().unwrap();
            // There is no direct public accessor for `reverse`, so assert
            // the forward-edge side of invariant (1)/(2): A1 still lists
            // both as forward references after the round trip.
            let forward = sheet.get_cell(pos("A1")).unwrap().unwrap().referenced_cells();
            assert!(forward.contains(&referenced.position()));
        }
    }
}
