//! The per-node aggregate: the immutable column/row schema plus the
//! mutable per-column data snapshots it governs.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::cdc::ColumnDataChange;
use crate::column_data::{ColumnData, ColumnDataError};
use crate::ids::{ColumnId, NodeId, RowId};
use crate::schema::{ColumnList, RowList};
use crate::value::CellValue;

#[derive(Debug, Error, PartialEq)]
pub enum NodeError {
    #[error("unknown column {0}")]
    UnknownColumn(ColumnId),
    #[error("unknown row {0}")]
    UnknownRow(RowId),
    #[error("{originator} is not permitted to write {row} of column {column}")]
    NotPermitted { originator: String, column: ColumnId, row: RowId },
    #[error(transparent)]
    ColumnData(#[from] ColumnDataError),
}

/// Owns one node's schema (loaded once at startup, never mutated) and its
/// live per-column data. Updates arrive as [`ColumnDataChange`]s and are
/// applied one row at a time so a partially-invalid change still commits
/// the rows that do pass validation, with the failures reported back.
pub struct Node {
    pub local_node_id: NodeId,
    pub upstream_id: Option<NodeId>,
    pub columns: ColumnList,
    pub rows: RowList,
    data: FxHashMap<ColumnId, ColumnData>,
}

impl Node {
    pub fn new(
        local_node_id: NodeId,
        upstream_id: Option<NodeId>,
        columns: ColumnList,
        rows: RowList,
    ) -> Self {
        Self { local_node_id, upstream_id, columns, rows, data: FxHashMap::default() }
    }

    pub fn column_data(&self, column: &ColumnId) -> Option<&ColumnData> {
        self.data.get(column)
    }

    /// Writes a single cell produced by formula recomputation rather than
    /// an inbound CDC. Skips the update-filter permission check (the
    /// engine, not an external originator, is writing) but still enforces
    /// the column's kind/timestamp invariants.
    pub fn set_computed_cell(
        &mut self,
        column: ColumnId,
        row: RowId,
        value: CellValue,
        at: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), NodeError> {
        let entry = self.data.entry(column.clone()).or_insert_with(|| ColumnData::new(column, at));
        entry.set_cell(row, value, at).map_err(NodeError::ColumnData)
    }

    /// Applies a change, validating each row write against the column's
    /// update filter, the row's declared kind, and the column's
    /// monotonic-timestamp invariant. Returns the rows that were actually
    /// applied; the first rejection for a row is collected rather than
    /// aborting the whole change.
    pub fn apply_cdc(
        &mut self,
        cdc: &ColumnDataChange,
    ) -> (Vec<RowId>, Vec<(RowId, NodeError)>) {
        let mut applied = Vec::new();
        let mut rejected = Vec::new();

        let column = match self.columns.get(&cdc.target_column) {
            Some(c) => c.clone(),
            None => {
                return (
                    applied,
                    cdc.changes
                        .iter()
                        .map(|(r, _)| (r.clone(), NodeError::UnknownColumn(cdc.target_column.clone())))
                        .collect(),
                )
            }
        };

        let entry = self
            .data
            .entry(cdc.target_column.clone())
            .or_insert_with(|| ColumnData::new(cdc.target_column.clone(), cdc.change_timestamp));

        for (row_id, value) in &cdc.changes {
            let Some(row) = self.rows.get(row_id) else {
                rejected.push((row_id.clone(), NodeError::UnknownRow(row_id.clone())));
                continue;
            };
            if !column.update_filter.permits(&cdc.originator, row_id) {
                rejected.push((
                    row_id.clone(),
                    NodeError::NotPermitted {
                        originator: cdc.originator.clone(),
                        column: cdc.target_column.clone(),
                        row: row_id.clone(),
                    },
                ));
                continue;
            }
            if value.kind() != row.kind {
                rejected.push((
                    row_id.clone(),
                    NodeError::ColumnData(ColumnDataError::KindMismatch {
                        column: cdc.target_column.clone(),
                        row: row_id.clone(),
                        expected: row.kind,
                        actual: value.kind(),
                    }),
                ));
                continue;
            }
            match entry.set_cell(row_id.clone(), value.clone(), cdc.change_timestamp) {
                Ok(()) => applied.push(row_id.clone()),
                Err(e) => rejected.push((row_id.clone(), NodeError::ColumnData(e))),
            }
        }

        (applied, rejected)
    }
}
