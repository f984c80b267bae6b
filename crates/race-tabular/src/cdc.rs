//! Column Data Change: the delta a node sends or receives describing
//! writes to a single column.

use chrono::{DateTime, Utc};

use crate::ids::{ColumnId, RowId};
use crate::value::CellValue;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDataChange {
    pub originator: String,
    pub target_column: ColumnId,
    pub change_timestamp: DateTime<Utc>,
    pub changes: Vec<(RowId, CellValue)>,
}

impl ColumnDataChange {
    pub fn new(
        originator: impl Into<String>,
        target_column: ColumnId,
        change_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            originator: originator.into(),
            target_column,
            change_timestamp,
            changes: Vec::new(),
        }
    }

    pub fn push(&mut self, row: RowId, value: CellValue) {
        self.changes.push((row, value));
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn push_accumulates_changes_in_order() {
        let mut cdc = ColumnDataChange::new(
            "sensor1",
            ColumnId::from("/c1"),
            Utc.timestamp_opt(100, 0).unwrap(),
        );
        cdc.push(RowId::from("/r1"), CellValue::Integer(1));
        cdc.push(RowId::from("/r2"), CellValue::Integer(2));
        assert_eq!(cdc.changes.len(), 2);
        assert_eq!(cdc.changes[0].0, RowId::from("/r1"));
    }
}
