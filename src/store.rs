//! Per-parse storage: one cell and one found-bit per option.

use crate::schema::Schema;
use crate::value::Value;

/// Storage for a single option.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell {
    /// Flags, callbacks, help and sentinels: the found-bit is the state.
    Unit,
    Single(Option<Value>),
    Multiple(Vec<Value>),
}

/// Values accumulated during one parse.
///
/// A found-bit is set exactly when something was written to its cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Store {
    found: Vec<bool>,
    cells: Vec<Cell>,
}

impl Store {
    pub(crate) fn for_schema(schema: &Schema) -> Self {
        let cells = schema
            .iter()
            .map(|spec| {
                if !spec.holds_value() {
                    Cell::Unit
                } else if spec.is_multiple() {
                    Cell::Multiple(Vec::new())
                } else {
                    Cell::Single(None)
                }
            })
            .collect::<Vec<_>>();
        Self {
            found: vec![false; cells.len()],
            cells,
        }
    }

    pub(crate) fn is_found(&self, index: usize) -> bool {
        self.found[index]
    }

    pub(crate) fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// Record a match of an option that carries no value.
    pub(crate) fn mark_found(&mut self, index: usize) {
        debug_assert!(matches!(self.cells[index], Cell::Unit));
        self.found[index] = true;
    }

    /// Write a value: replace it for single cells, append it for multiple ones.
    pub(crate) fn write(&mut self, index: usize, value: Value) {
        match &mut self.cells[index] {
            Cell::Single(slot) => *slot = Some(value),
            Cell::Multiple(values) => values.push(value),
            Cell::Unit => return,
        }
        self.found[index] = true;
    }
}
