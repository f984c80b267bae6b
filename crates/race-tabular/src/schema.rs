//! `Column`/`Row` declarations and the immutable `ColumnList`/`RowList`
//! they're loaded into once per node instance (spec.md 4.F/4.G).

use rustc_hash::FxHashMap;

use crate::ids::{ColumnId, RowId};
use crate::value::CellKind;

/// An (originator pattern, row pattern) pair naming who may write which
/// rows of a column. Pattern matching reuses [`race_common::GlobPath`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdateFilterEntry {
    pub originator_pattern: String,
    pub row_pattern: String,
}

impl UpdateFilterEntry {
    pub fn allows(&self, originator: &str, row: &RowId) -> bool {
        race_common::GlobPath::compile(&self.originator_pattern).matches(originator)
            && race_common::GlobPath::compile(&self.row_pattern).matches(row.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UpdateFilterSpec {
    pub entries: Vec<UpdateFilterEntry>,
}

impl UpdateFilterSpec {
    pub fn permits(&self, originator: &str, row: &RowId) -> bool {
        self.entries.is_empty() || self.entries.iter().any(|e| e.allows(originator, row))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub owner_node: String,
    pub update_filter: UpdateFilterSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RowAttr {
    Header,
    Locked,
    Hidden,
    Computed,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Row {
    pub id: RowId,
    pub kind: CellKind,
    #[serde(default)]
    pub attrs: Vec<RowAttr>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Row {
    pub fn has_attr(&self, attr: RowAttr) -> bool {
        self.attrs.contains(&attr)
    }

    pub fn is_computed(&self) -> bool {
        self.has_attr(RowAttr::Computed) || self.formula.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ColumnList {
    pub columns: Vec<Column>,
}

impl ColumnList {
    pub fn get(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ColumnId> {
        self.columns.iter().map(|c| &c.id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowList {
    pub rows: Vec<Row>,
    by_id: FxHashMap<RowId, usize>,
}

impl RowList {
    pub fn new(rows: Vec<Row>) -> Self {
        let by_id = rows.iter().enumerate().map(|(i, r)| (r.id.clone(), i)).collect();
        Self { rows, by_id }
    }

    pub fn get(&self, id: &RowId) -> Option<&Row> {
        self.by_id.get(id).map(|&i| &self.rows[i])
    }

    pub fn ids(&self) -> impl Iterator<Item = &RowId> {
        self.rows.iter().map(|r| &r.id)
    }

    pub fn computed(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.is_computed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_filter_permits_matching_originator_and_row() {
        let spec = UpdateFilterSpec {
            entries: vec![UpdateFilterEntry {
                originator_pattern: "sensor*".into(),
                row_pattern: "/r{1,2}".into(),
            }],
        };
        assert!(spec.permits("sensor7", &RowId::from("/r1")));
        assert!(!spec.permits("sensor7", &RowId::from("/r3")));
        assert!(!spec.permits("other", &RowId::from("/r1")));
    }

    #[test]
    fn empty_filter_permits_everything() {
        let spec = UpdateFilterSpec::default();
        assert!(spec.permits("anyone", &RowId::from("/any")));
    }

    #[test]
    fn row_is_computed_via_attr_or_formula() {
        let row = Row {
            id: RowId::from("/r1"),
            kind: CellKind::Real,
            attrs: vec![],
            formula: Some("(Sum a b)".into()),
            min: None,
            max: None,
        };
        assert!(row.is_computed());
    }
}
