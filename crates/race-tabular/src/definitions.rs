//! serde-derived shapes of the JSON definition files (columnList, rowList,
//! formulaList, columnData, CDC wire form) and loaders converting them into
//! the internal types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cdc::ColumnDataChange;
use crate::column_data::ColumnData;
use crate::ids::{ColumnId, RowId};
use crate::schema::{Column, ColumnList, Row, RowAttr, RowList, UpdateFilterEntry, UpdateFilterSpec};
use crate::value::CellValue;

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("malformed update-filter entry {0:?}: expected \"originator:row\"")]
    MalformedUpdateFilter(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ColumnDef {
    id: String,
    #[serde(default)]
    info: String,
    owner: String,
    #[serde(default)]
    update: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnListFile {
    pub id: String,
    #[serde(default)]
    pub info: String,
    pub date: DateTime<Utc>,
    columns: Vec<ColumnDef>,
}

impl ColumnListFile {
    pub fn into_column_list(self) -> Result<ColumnList, DefinitionError> {
        let columns = self
            .columns
            .into_iter()
            .map(|c| {
                let entries = c
                    .update
                    .iter()
                    .map(|s| parse_update_filter_entry(s))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Column {
                    id: ColumnId::from(c.id),
                    owner_node: c.owner,
                    update_filter: UpdateFilterSpec { entries },
                })
            })
            .collect::<Result<Vec<_>, DefinitionError>>()?;
        Ok(ColumnList { columns })
    }
}

fn parse_update_filter_entry(s: &str) -> Result<UpdateFilterEntry, DefinitionError> {
    let (originator, row) = s
        .split_once(':')
        .ok_or_else(|| DefinitionError::MalformedUpdateFilter(s.to_string()))?;
    Ok(UpdateFilterEntry {
        originator_pattern: originator.to_string(),
        row_pattern: row.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RowDef {
    id: String,
    #[serde(default)]
    info: String,
    #[serde(rename = "type")]
    kind: crate::value::CellKind,
    #[serde(default)]
    attrs: Vec<RowAttr>,
    #[serde(default)]
    formula: Option<String>,
    #[serde(default)]
    min: Option<f64>,
    #[serde(default)]
    max: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowListFile {
    pub id: String,
    #[serde(default)]
    pub info: String,
    pub date: DateTime<Utc>,
    rows: Vec<RowDef>,
}

impl RowListFile {
    pub fn into_row_list(self) -> RowList {
        RowList::new(
            self.rows
                .into_iter()
                .map(|r| Row {
                    id: RowId::from(r.id),
                    kind: r.kind,
                    attrs: r.attrs,
                    formula: r.formula,
                    min: r.min,
                    max: r.max,
                })
                .collect(),
        )
    }
}

/// Per-column map of row id → formula source text.
pub type FormulaListFile = HashMap<String, HashMap<String, String>>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CellEntry {
    #[serde(flatten)]
    value: CellValue,
    date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDataFile {
    pub id: String,
    pub date: DateTime<Utc>,
    rows: HashMap<String, CellEntry>,
}

impl ColumnDataFile {
    pub fn into_column_data(self) -> ColumnData {
        let mut data = ColumnData::new(ColumnId::from(self.id), self.date);
        for (row_id, entry) in self.rows {
            // Loaded snapshots are trusted: every cell's date already
            // satisfies the monotonic invariant by construction on disk.
            let _ = data.set_cell(RowId::from(row_id), entry.value, entry.date);
        }
        data
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDataChangeFile {
    pub column_id: String,
    pub change_node_id: String,
    pub date: DateTime<Utc>,
    pub changed_values: HashMap<String, CellEntry>,
}

impl ColumnDataChangeFile {
    pub fn into_cdc(self) -> ColumnDataChange {
        let mut cdc = ColumnDataChange::new(self.change_node_id, ColumnId::from(self.column_id), self.date);
        for (row_id, entry) in self.changed_values {
            cdc.push(RowId::from(row_id), entry.value);
        }
        cdc
    }
}

pub fn load_column_list(json: &str) -> Result<ColumnList, DefinitionError> {
    let file: ColumnListFile = serde_json::from_str(json)?;
    file.into_column_list()
}

pub fn load_row_list(json: &str) -> Result<RowList, DefinitionError> {
    let file: RowListFile = serde_json::from_str(json)?;
    Ok(file.into_row_list())
}

pub fn load_column_data(json: &str) -> Result<ColumnData, DefinitionError> {
    let file: ColumnDataFile = serde_json::from_str(json)?;
    Ok(file.into_column_data())
}

pub fn load_cdc(json: &str) -> Result<ColumnDataChange, DefinitionError> {
    let file: ColumnDataChangeFile = serde_json::from_str(json)?;
    Ok(file.into_cdc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_list_round_trips_update_filter_patterns() {
        let json = r#"{
            "id": "cols",
            "info": "",
            "date": "2026-01-01T00:00:00Z",
            "columns": [
                {"id": "/c1", "info": "", "owner": "node-a", "update": ["sensor*:/r*"]}
            ]
        }"#;
        let list = load_column_list(json).unwrap();
        let col = list.get(&ColumnId::from("/c1")).unwrap();
        assert!(col.update_filter.permits("sensor1", &RowId::from("/r1")));
    }

    #[test]
    fn row_list_parses_type_attrs_and_formula() {
        let json = r#"{
            "id": "rows",
            "info": "",
            "date": "2026-01-01T00:00:00Z",
            "rows": [
                {"id": "/r1", "info": "", "type": "real", "attrs": ["computed"], "formula": "(Sum a b)"}
            ]
        }"#;
        let list = load_row_list(json).unwrap();
        let row = list.get(&RowId::from("/r1")).unwrap();
        assert!(row.is_computed());
        assert_eq!(row.formula.as_deref(), Some("(Sum a b)"));
    }

    #[test]
    fn column_data_file_populates_cells() {
        let json = r#"{
            "id": "/c1",
            "date": "2026-01-01T00:00:10Z",
            "rows": {"/r1": {"kind": "integer", "value": 5, "date": "2026-01-01T00:00:05Z"}}
        }"#;
        let data = load_column_data(json).unwrap();
        assert_eq!(data.get(&RowId::from("/r1")).unwrap().value, CellValue::Integer(5));
    }

    #[test]
    fn cdc_file_parses_camel_case_envelope() {
        let json = r#"{
            "columnId": "/c1",
            "changeNodeId": "sensor1",
            "date": "2026-01-01T00:00:10Z",
            "changedValues": {"/r1": {"kind": "integer", "value": 5, "date": "2026-01-01T00:00:10Z"}}
        }"#;
        let cdc = load_cdc(json).unwrap();
        assert_eq!(cdc.originator, "sensor1");
        assert_eq!(cdc.changes.len(), 1);
    }
}
