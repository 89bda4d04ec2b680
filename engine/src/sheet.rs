//! FILENAME: engine/src/sheet.rs
//! PURPOSE: The sparse grid: cell storage, row/column occupancy bookkeeping,
//! printable-size computation, and the graph-traversing halves of the
//! formula-set protocol, cache invalidation, and cycle detection that
//! `Cell` itself cannot perform (see cell.rs's module doc).
//! CONTEXT: Grounded on `original_source/spreadsheet/sheet.cpp` (`SetCell`,
//! `GetCell`, `ClearCell`, `UpdateSize`, `GetPrintableSize`, `PrintValues`,
//! `PrintTexts`) and `cell.cpp` (`SetFormulaImpl`, `InvalidateCacheImpl`,
//! `CheckCycleDependencyImpl`), generalized from the teacher's `Grid`
//! (core/engine/src/grid.rs, a plain `HashMap<(u32,u32), Cell>` with no
//! dependency graph at all) into the full dependency-tracking sheet spec.md
//! §4.9 describes.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::io::{self, Write};

use crate::body::CellBody;
use crate::cell::Cell;
use crate::error::{CircularDependency, FormulaException, InvalidPosition, SetCellError};
use crate::eval;
use crate::position::Position;
use crate::value::Value;

/// Sparse spreadsheet storage plus the dependency graph threaded through it.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
    /// Per-occupied-row cell count; a zero count implies absence of the key
    /// (spec.md §3 invariant 5). `BTreeMap` gives the max-key lookup
    /// `printable_size` needs in O(log n), mirroring the teacher's ordered
    /// `std::map` (`original_source/sheet.cpp`'s `(--m.end())->first`).
    row_counts: BTreeMap<u32, u32>,
    col_counts: BTreeMap<u32, u32>,
}

/// A borrowed, read-only view of a cell bundled with the sheet that owns it
/// — this is what lets `get_value`/`get_text`/`referenced_cells` live on a
/// `Cell`-shaped handle (matching spec.md §6's public API) while the actual
/// traversal stays on `Sheet`, per cell.rs's module doc.
pub struct CellHandle<'a> {
    sheet: &'a Sheet,
    cell: &'a Cell,
}

impl<'a> CellHandle<'a> {
    /// Returns the cached value if valid; otherwise derives it directly for
    /// non-formula bodies, or evaluates and caches it for a formula body
    /// (spec.md §4.4).
    pub fn get_value(&self) -> Value {
        if let Some(cached) = self.cell.cached_value() {
            return cached;
        }
        match self.cell.body() {
            CellBody::Formula { ast, refs, .. } => {
                let value = eval::evaluate_formula(refs, ast, self.sheet);
                self.cell.set_cached_value(value.clone());
                value
            }
            non_formula => non_formula.direct_value().expect("non-formula body always has a direct value"),
        }
    }

    pub fn get_text(&self) -> String {
        self.cell.get_text()
    }

    pub fn referenced_cells(&self) -> Vec<Position> {
        self.cell.referenced_cells()
    }

    pub fn position(&self) -> Position {
        self.cell.position()
    }
}

impl Sheet {
    pub fn new() -> Self {
        Sheet {
            cells: HashMap::new(),
            row_counts: BTreeMap::new(),
            col_counts: BTreeMap::new(),
        }
    }

    /// Looks up the cell at `pos`, wrapped in the sheet-aware handle that
    /// implements spec.md §6's `Cell` public API.
    pub fn get_cell(&self, pos: Position) -> Result<Option<CellHandle<'_>>, InvalidPosition> {
        if !pos.is_valid() {
            return Err(InvalidPosition);
        }
        Ok(self.cells.get(&pos).map(|cell| CellHandle { sheet: self, cell }))
    }

    /// Writes `text` to `pos`, materializing the cell if absent. Strong
    /// exception safety: on any error, the sheet is observably identical to
    /// its pre-call state (spec.md §4.5/§7).
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<(), SetCellError> {
        if !pos.is_valid() {
            return Err(InvalidPosition.into());
        }

        if let Some(cell) = self.cells.get(&pos) {
            if cell.get_text() == text {
                return Ok(());
            }
            self.apply_set(pos, text)
        } else {
            self.cells.insert(pos, Cell::new_empty(pos));
            match self.apply_set(pos, text) {
                Ok(()) => {
                    self.bump_counts(pos);
                    Ok(())
                }
                Err(e) => {
                    // Newly created and the formula-set protocol rolled
                    // back to Empty with no dependents: undo the creation
                    // entirely rather than leave a phantom empty cell.
                    if self
                        .cells
                        .get(&pos)
                        .map(|c| c.is_empty_with_no_dependents())
                        .unwrap_or(false)
                    {
                        self.cells.remove(&pos);
                    }
                    Err(e)
                }
            }
        }
    }

    /// Equivalent to `set_cell(pos, "")` (spec.md §9: `Clear()` is adopted
    /// as `Set("")` rather than a direct empty-assignment, since only the
    /// `set` path runs the reverse-edge bookkeeping that keeps invariants
    /// (1)/(2) intact).
    pub fn clear_cell(&mut self, pos: Position) -> Result<(), InvalidPosition> {
        if !pos.is_valid() {
            return Err(InvalidPosition);
        }
        self.set_cell(pos, "").map_err(|e| match e {
            SetCellError::InvalidPosition(e) => e,
            // `Clear` can only fail to parse or cycle if the new text were
            // a formula; `""` is neither, so these are unreachable.
            _ => unreachable!("clearing a cell can only fail with InvalidPosition"),
        })
    }

    /// `(max occupied row + 1, max occupied col + 1)`, or `(0, 0)` if empty.
    pub fn printable_size(&self) -> (u32, u32) {
        let rows = self.row_counts.keys().next_back().map(|r| r + 1).unwrap_or(0);
        let cols = self.col_counts.keys().next_back().map(|c| c + 1).unwrap_or(0);
        (rows, cols)
    }

    pub fn print_values(&self, out: &mut impl Write) -> io::Result<()> {
        self.print_rows(out, |handle| handle.get_value().to_string())
    }

    pub fn print_texts(&self, out: &mut impl Write) -> io::Result<()> {
        self.print_rows(out, |handle| handle.get_text())
    }

    fn print_rows<'a>(&'a self, out: &mut impl Write, render: impl Fn(&CellHandle<'a>) -> String) -> io::Result<()> {
        let (rows, cols) = self.printable_size();
        for row in 0..rows {
            for col in 0..cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                let pos = Position::new(row, col);
                if let Some(cell) = self.cells.get(&pos) {
                    let handle = CellHandle { sheet: self, cell };
                    write!(out, "{}", render(&handle))?;
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    /// Resolves a cell's value for formula evaluation. A non-existent cell
    /// reads as empty text, matching spec.md §4.3's "empty/`Text(\"\")`
    /// coerces to 0" rule at the point where evaluation consumes it.
    pub(crate) fn value_at(&self, pos: Position) -> Value {
        match self.cells.get(&pos) {
            None => Value::empty(),
            Some(cell) => CellHandle { sheet: self, cell }.get_value(),
        }
    }

    fn bump_counts(&mut self, pos: Position) {
        *self.row_counts.entry(pos.row).or_insert(0) += 1;
        *self.col_counts.entry(pos.col).or_insert(0) += 1;
    }

    fn drop_counts(&mut self, pos: Position) {
        if let Some(count) = self.row_counts.get_mut(&pos.row) {
            *count -= 1;
            if *count == 0 {
                self.row_counts.remove(&pos.row);
            }
        }
        if let Some(count) = self.col_counts.get_mut(&pos.col) {
            *count -= 1;
            if *count == 0 {
                self.col_counts.remove(&pos.col);
            }
        }
    }

    /// The formula-set protocol: spec.md §4.4/§4.5, applied uniformly for
    /// every `set_cell` call (not just formula-to-formula transitions) so
    /// the old/new forward-edge diff in step 7 also handles detaching a
    /// formula cell that becomes `Text`/`Empty` — this is the REDESIGN
    /// FLAG spec.md §9 calls for ("a universal post-condition of any edge
    /// removal", not ad hoc per call site as in the C++ original).
    ///
    /// Precondition: `self.cells` already contains a cell at `pos` (either
    /// pre-existing, or just materialized `Empty` by the caller).
    fn apply_set(&mut self, pos: Position, text: &str) -> Result<(), SetCellError> {
        let old_body = self.cells[&pos].body().clone();
        let old_forward: Vec<Position> = self.cells[&pos].forward().to_vec();

        let (new_body, new_forward) = build_body(text)?;

        // Step 4: materialize Empty cells for valid, currently-missing
        // referenced positions. Tracked so a subsequent cycle-rollback can
        // undo exactly these, and no others.
        let mut created = Vec::new();
        for &p in &new_forward {
            if p.is_valid() && !self.cells.contains_key(&p) {
                self.cells.insert(p, Cell::new_empty(p));
                self.bump_counts(p);
                created.push(p);
            }
        }

        // Step 5: tentatively install the new body so the cycle check (run
        // next) sees the prospective graph, not the old one.
        self.cells.get_mut(&pos).unwrap().set_body(new_body, new_forward.clone());

        // Step 6: cycle check over the prospective forward graph.
        if self.has_cycle_from(pos) {
            self.cells.get_mut(&pos).unwrap().set_body(old_body, old_forward);
            for p in created {
                if self.cells.get(&p).map(|c| c.is_empty_with_no_dependents()).unwrap_or(false) {
                    self.cells.remove(&p);
                    self.drop_counts(p);
                }
            }
            return Err(CircularDependency.into());
        }

        // Step 7: commit the forward-edge diff into every referenced cell's
        // reverse set, dropping the cells that become empty-with-no-dependents.
        let old_set: BTreeSet<Position> = old_forward.iter().copied().collect();
        let new_set: BTreeSet<Position> = new_forward.iter().copied().collect();
        for &p in new_set.difference(&old_set) {
            if let Some(c) = self.cells.get_mut(&p) {
                c.add_reverse(pos);
            }
        }
        for &p in old_set.difference(&new_set) {
            self.detach_reverse_edge(p, pos);
        }

        // Step 8: invalidate this cell's cache and transitively every
        // ancestor reachable via reverse edges.
        self.invalidate_from(pos);

        Ok(())
    }

    /// Removes `source` from `target`'s reverse set, deleting `target` if it
    /// is thereafter an empty cell with no remaining dependents.
    fn detach_reverse_edge(&mut self, target: Position, source: Position) {
        if let Some(c) = self.cells.get_mut(&target) {
            c.remove_reverse(source);
            if c.is_empty_with_no_dependents() {
                self.cells.remove(&target);
                self.drop_counts(target);
            }
        }
    }

    /// Two-color DFS over the prospective forward graph rooted at `start`
    /// (spec.md §4.8). `visiting`/`visited` are stack-local scratch, not
    /// per-cell state — the Design Notes explicitly call out the C++
    /// original's shared mutable sets as something to avoid reproducing.
    fn has_cycle_from(&self, start: Position) -> bool {
        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        self.dfs_has_cycle(start, &mut visiting, &mut visited)
    }

    fn dfs_has_cycle(&self, pos: Position, visiting: &mut HashSet<Position>, visited: &mut HashSet<Position>) -> bool {
        if visiting.contains(&pos) {
            return true;
        }
        if visited.contains(&pos) {
            return false;
        }
        visiting.insert(pos);
        if let Some(cell) = self.cells.get(&pos) {
            for &next in cell.forward() {
                // Invalid positions can't participate in a cycle; missing
                // cells were just materialized as Empty and have no
                // outgoing edges of their own, so they're safe to recurse
                // into (the lookup below simply finds nothing to walk).
                if next.is_valid() && self.dfs_has_cycle(next, visiting, visited) {
                    return true;
                }
            }
        }
        visiting.remove(&pos);
        visited.insert(pos);
        false
    }

    /// Walks reverse edges from `start`, clearing each visited cell's cache.
    /// Maintains an explicit visited set (spec.md §4.6's mandated deviation
    /// from the original `InvalidateCacheImpl`, which has none and would
    /// loop forever on a reverse cycle). `start` itself is always cleared
    /// and always walked further, since it is the cell that just changed;
    /// for every other cell, an already-absent cache means its own
    /// ancestors were invalidated in an earlier pass and nothing has
    /// revalidated them since, so traversal stops there.
    fn invalidate_from(&mut self, start: Position) {
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        visited.insert(start);

        while let Some(pos) = stack.pop() {
            let Some(cell) = self.cells.get(&pos) else { continue };
            let had_cache = cell.take_cached_value().is_some();
            if pos != start && !had_cache {
                continue;
            }
            for &next in cell.reverse() {
                if visited.insert(next) {
                    stack.push(next);
                }
            }
        }
    }
}

/// Classifies `text` per spec.md §4.4/§6 and, for the formula case, parses
/// it and extracts the sorted-unique referenced positions. Does not touch
/// the sheet — callers materialize referenced cells and commit edges.
fn build_body(text: &str) -> Result<(CellBody, Vec<Position>), SetCellError> {
    if text.is_empty() {
        return Ok((CellBody::Empty, Vec::new()));
    }
    if text.starts_with('=') && text.len() > 1 {
        let expr_text = &text[1..];
        let ast = formula::parse(expr_text).map_err(FormulaException)?;
        let canonical_text = format!("={}", ast);
        let mut refs: Vec<Position> = formula::referenced_cells(&ast)
            .into_iter()
            .map(|(col, row)| Position::from_label_parts(&col, row))
            .collect();
        refs.sort();
        refs.dedup();
        let body = CellBody::Formula { ast, canonical_text, refs: refs.clone() };
        Ok((body, refs))
    } else {
        Ok((CellBody::Text(text.to_string()), Vec::new()))
    }
}
