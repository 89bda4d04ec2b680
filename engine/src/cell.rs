//! FILENAME: engine/src/cell.rs
//! PURPOSE: Per-cell state: body, cached value, forward/reverse dependency
//! edges, position.
//! CONTEXT: Grounded on `original_source/spreadsheet/cell.h`/`cell.cpp`'s
//! `Cell` (body via `impl_`, `cache_`, `parents_cells_`/`child_cells_`).
//! A `Cell` in this crate cannot hold a live reference back to the `Sheet`
//! that owns it — unlike the C++ original's `SheetInterface& sheet_`, Rust's
//! borrow checker rejects a value holding a reference into the collection it
//! lives inside. So `Cell` exposes only local, no-traversal-needed
//! operations; everything that walks the dependency graph (the formula-set
//! protocol, cache invalidation, cycle detection) is implemented as a
//! `Sheet` method that indexes into `Sheet::cells` by `Position` instead of
//! through a pointer. See `sheet.rs` for that half of spec.md §4.4-§4.8.

use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::body::CellBody;
use crate::position::Position;
use crate::value::Value;

/// One cell's full local state. `cache` uses interior mutability so a
/// read-only sheet traversal (`Sheet::value_at`) can populate it without
/// requiring `&mut Sheet` on every read — safe here because spec.md §5's
/// single-threaded, non-reentrant model guarantees no concurrent mutation
/// can ever make the `RefCell`'s runtime borrow check panic.
#[derive(Debug, Clone)]
pub struct Cell {
    position: Position,
    body: CellBody,
    cache: RefCell<Option<Value>>,
    /// Referenced positions of the current formula body, sorted-unique.
    /// Empty for non-formula bodies.
    forward: Vec<Position>,
    /// Positions of cells whose *current* formula body references this cell.
    reverse: BTreeSet<Position>,
}

impl Cell {
    /// A freshly materialized `Empty` cell at `position`.
    pub fn new_empty(position: Position) -> Self {
        Cell {
            position,
            body: CellBody::Empty,
            cache: RefCell::new(None),
            forward: Vec::new(),
            reverse: BTreeSet::new(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn body(&self) -> &CellBody {
        &self.body
    }

    pub(crate) fn set_body(&mut self, body: CellBody, forward: Vec<Position>) {
        self.body = body;
        self.forward = forward;
    }

    /// The body's text (`""` for Empty, raw string for Text, canonical
    /// `"=" ++ ast.print()` for Formula).
    pub fn get_text(&self) -> String {
        self.body.text().to_string()
    }

    /// `forward` as an ordered, unique list, per spec.md §4.4.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.forward.clone()
    }

    pub(crate) fn forward(&self) -> &[Position] {
        &self.forward
    }

    pub(crate) fn reverse(&self) -> &BTreeSet<Position> {
        &self.reverse
    }

    pub(crate) fn reverse_is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    pub(crate) fn add_reverse(&mut self, from: Position) {
        self.reverse.insert(from);
    }

    pub(crate) fn remove_reverse(&mut self, from: Position) {
        self.reverse.remove(&from);
    }

    pub(crate) fn is_empty_with_no_dependents(&self) -> bool {
        self.body.is_empty() && self.reverse.is_empty()
    }

    pub(crate) fn cached_value(&self) -> Option<Value> {
        self.cache.borrow().clone()
    }

    pub(crate) fn set_cached_value(&self, value: Value) {
        *self.cache.borrow_mut() = Some(value);
    }

    /// Clears the cache, returning whether it held a value beforehand — used
    /// by `Sheet::invalidate_from` to decide whether to keep walking reverse
    /// edges (spec.md §4.6).
    pub(crate) fn take_cached_value(&self) -> Option<Value> {
        self.cache.borrow_mut().take()
    }

    pub(crate) fn is_formula(&self) -> bool {
        self.body.is_formula()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_empty_cell_has_no_edges_and_no_cache() {
        let cell = Cell::new_empty(Position::new(0, 0));
        assert_eq!(cell.get_text(), "");
        assert!(cell.referenced_cells().is_empty());
        assert!(cell.reverse_is_empty());
        assert_eq!(cell.cached_value(), None);
    }

    #[test]
    fn cache_round_trips() {
        let cell = Cell::new_empty(Position::new(0, 0));
        cell.set_cached_value(Value::Number(3.0));
        assert_eq!(cell.cached_value(), Some(Value::Number(3.0)));
        assert_eq!(cell.take_cached_value(), Some(Value::Number(3.0)));
        assert_eq!(cell.cached_value(), None);
    }
}
