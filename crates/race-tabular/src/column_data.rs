//! A column's current snapshot: one [`TimedValue`] per row that has ever
//! been written, plus the timestamp of the column's last update.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ids::{ColumnId, RowId};
use crate::value::{CellValue, TimedValue};

#[derive(Debug, Error, PartialEq)]
pub enum ColumnDataError {
    #[error("cell {row} has kind {actual} but column {column} declares {expected}")]
    KindMismatch {
        column: ColumnId,
        row: RowId,
        expected: crate::value::CellKind,
        actual: crate::value::CellKind,
    },
    #[error("cell {row} timestamp {cell_at} precedes its own current timestamp {previous} in column {column}")]
    StaleCellTimestamp {
        column: ColumnId,
        row: RowId,
        cell_at: DateTime<Utc>,
        previous: DateTime<Utc>,
    },
}

/// Invariant: a write to a given cell never moves that cell's own timestamp
/// backwards. `last_update` is a column-level "most recent write" stat, not
/// a gate — an unwritten row's first write is never compared against it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    pub column_id: ColumnId,
    pub last_update: DateTime<Utc>,
    cells: FxHashMap<RowId, TimedValue>,
}

impl ColumnData {
    pub fn new(column_id: ColumnId, last_update: DateTime<Utc>) -> Self {
        Self { column_id, last_update, cells: FxHashMap::default() }
    }

    pub fn get(&self, row: &RowId) -> Option<&TimedValue> {
        self.cells.get(row)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RowId, &TimedValue)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Writes one cell, rejecting a timestamp older than that same cell's
    /// own previous write. A row with no prior write has no timestamp to
    /// violate, so its first write is always accepted regardless of what
    /// other rows in the column have been stamped with. `last_update`
    /// advances whenever `at` is newer than it, purely as a column-level
    /// stat.
    pub fn set_cell(
        &mut self,
        row: RowId,
        value: CellValue,
        at: DateTime<Utc>,
    ) -> Result<(), ColumnDataError> {
        if let Some(previous) = self.cells.get(&row) {
            if at < previous.at {
                return Err(ColumnDataError::StaleCellTimestamp {
                    column: self.column_id.clone(),
                    row,
                    cell_at: at,
                    previous: previous.at,
                });
            }
        }
        if at > self.last_update {
            self.last_update = at;
        }
        self.cells.insert(row, TimedValue::new(value, at));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn set_cell_advances_last_update_forward() {
        let mut data = ColumnData::new(ColumnId::from("/c1"), t(0));
        data.set_cell(RowId::from("/r1"), CellValue::Integer(1), t(10)).unwrap();
        assert_eq!(data.last_update, t(10));
        assert_eq!(data.get(&RowId::from("/r1")).unwrap().value, CellValue::Integer(1));
    }

    #[test]
    fn set_cell_rejects_a_timestamp_older_than_that_cells_own_previous_write() {
        let mut data = ColumnData::new(ColumnId::from("/c1"), t(10));
        data.set_cell(RowId::from("/r1"), CellValue::Integer(1), t(10)).unwrap();
        let err = data.set_cell(RowId::from("/r1"), CellValue::Integer(2), t(5)).unwrap_err();
        assert!(matches!(err, ColumnDataError::StaleCellTimestamp { .. }));
    }

    #[test]
    fn set_cell_at_exactly_the_cells_previous_timestamp_is_allowed() {
        let mut data = ColumnData::new(ColumnId::from("/c1"), t(10));
        data.set_cell(RowId::from("/r1"), CellValue::Integer(1), t(10)).unwrap();
        data.set_cell(RowId::from("/r1"), CellValue::Integer(2), t(10)).unwrap();
        assert_eq!(data.get(&RowId::from("/r1")).unwrap().value, CellValue::Integer(2));
    }

    #[test]
    fn an_unwritten_row_is_never_gated_by_another_rows_timestamp() {
        let mut data = ColumnData::new(ColumnId::from("/c1"), t(0));
        data.set_cell(RowId::from("/r1"), CellValue::Integer(5), t(100)).unwrap();
        assert_eq!(data.last_update, t(100));

        // /r2 has never been written; its first write at an earlier time
        // than /r1's must still succeed.
        data.set_cell(RowId::from("/r2"), CellValue::Integer(7), t(90)).unwrap();
        assert_eq!(data.get(&RowId::from("/r2")).unwrap().value, CellValue::Integer(7));
    }
}
