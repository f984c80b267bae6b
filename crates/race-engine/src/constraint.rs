//! Bounds constraints: a row declaring `min`/`max` implies a named
//! predicate over every cell of that row across the columns touched by an
//! update. The engine tracks each constraint's current satisfied/violated
//! state and emits a [`ConstraintChange`] on transition, carrying the
//! offending cells.

use race_tabular::{CellValue, ColumnId, Row, RowId};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintChange {
    pub constraint_id: String,
    pub satisfied: bool,
    pub offending_cells: Vec<(ColumnId, RowId)>,
}

/// Tracks the last-known satisfied/violated state of every bounds
/// constraint seen so far, so re-evaluating an unchanged constraint is a
/// no-op rather than a repeated event.
#[derive(Default)]
pub struct ConstraintTracker {
    state: FxHashMap<String, bool>,
}

fn constraint_id(column: &ColumnId, row: &RowId) -> String {
    format!("{column}::{row}:bounds")
}

fn in_bounds(row: &Row, value: &CellValue) -> bool {
    let Some(v) = value.as_f64() else { return true };
    if let Some(min) = row.min {
        if v < min {
            return false;
        }
    }
    if let Some(max) = row.max {
        if v > max {
            return false;
        }
    }
    true
}

impl ConstraintTracker {
    /// Re-checks the bounds constraint for one cell against its row's
    /// declared `min`/`max`. Returns `Some` only when this check flips the
    /// constraint's previously recorded state (or establishes it for the
    /// first time as violated).
    pub fn check(&mut self, column: &ColumnId, row_id: &RowId, row: &Row, value: &CellValue) -> Option<ConstraintChange> {
        if row.min.is_none() && row.max.is_none() {
            return None;
        }
        let id = constraint_id(column, row_id);
        let satisfied = in_bounds(row, value);
        let previous = self.state.insert(id.clone(), satisfied);
        if previous == Some(satisfied) {
            return None;
        }
        let offending_cells = if satisfied { Vec::new() } else { vec![(column.clone(), row_id.clone())] };
        Some(ConstraintChange { constraint_id: id, satisfied, offending_cells })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_tabular::CellKind;

    fn bounded_row() -> Row {
        Row { id: RowId::from("/r1"), kind: CellKind::Real, attrs: vec![], formula: None, min: Some(0.0), max: Some(10.0) }
    }

    #[test]
    fn unbounded_row_never_emits_a_constraint() {
        let mut tracker = ConstraintTracker::default();
        let row = Row { id: RowId::from("/r1"), kind: CellKind::Real, attrs: vec![], formula: None, min: None, max: None };
        let change = tracker.check(&ColumnId::from("/c1"), &RowId::from("/r1"), &row, &CellValue::Real(1000.0));
        assert!(change.is_none());
    }

    #[test]
    fn transition_into_violation_is_reported_once() {
        let mut tracker = ConstraintTracker::default();
        let row = bounded_row();
        let col = ColumnId::from("/c1");
        let first = tracker.check(&col, &RowId::from("/r1"), &row, &CellValue::Real(5.0));
        assert!(first.is_none(), "starting in bounds is not a transition");

        let violated = tracker.check(&col, &RowId::from("/r1"), &row, &CellValue::Real(20.0)).unwrap();
        assert!(!violated.satisfied);
        assert_eq!(violated.offending_cells, vec![(col.clone(), RowId::from("/r1"))]);

        let repeat = tracker.check(&col, &RowId::from("/r1"), &row, &CellValue::Real(30.0));
        assert!(repeat.is_none(), "remaining violated is not a new transition");

        let recovered = tracker.check(&col, &RowId::from("/r1"), &row, &CellValue::Real(4.0)).unwrap();
        assert!(recovered.satisfied);
        assert!(recovered.offending_cells.is_empty());
    }
}
