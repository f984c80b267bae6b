//! Cell value sum type and the declared row kind it must agree with.
//! Mirrors the shape of a literal-value enum: one variant per recognized
//! kind, manual `Display`, and a timestamp carried alongside rather than
//! inside each variant (every cell is a `(CellValue, DateTime<Utc>)` pair,
//! never a bare value).

use std::fmt;

use chrono::{DateTime, Utc};

/// The kind a [`crate::Row`] declares; every [`CellValue`] written to that
/// row's cells must match it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellKind {
    Integer,
    Real,
    Boolean,
    Text,
    IntegerList,
    RealList,
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CellKind::Integer => "Integer",
            CellKind::Real => "Real",
            CellKind::Boolean => "Boolean",
            CellKind::Text => "Text",
            CellKind::IntegerList => "IntegerList",
            CellKind::RealList => "RealList",
        };
        write!(f, "{s}")
    }
}

/// A cell's payload. Absence (a missing cell) is represented by the
/// enclosing `Option<TimedValue>` in [`crate::ColumnData`], not a variant
/// here.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CellValue {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Text(String),
    IntegerList(Vec<i64>),
    RealList(Vec<f64>),
}

impl CellValue {
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Integer(_) => CellKind::Integer,
            CellValue::Real(_) => CellKind::Real,
            CellValue::Boolean(_) => CellKind::Boolean,
            CellValue::Text(_) => CellKind::Text,
            CellValue::IntegerList(_) => CellKind::IntegerList,
            CellValue::RealList(_) => CellKind::RealList,
        }
    }

    /// Widening numeric view used by formula evaluators that accept either
    /// `Integer` or `Real` (spec.md 4.G's kind-checked functions mostly
    /// operate on this coercion).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(v) => write!(f, "{v}"),
            CellValue::Real(v) => write!(f, "{v}"),
            CellValue::Boolean(v) => write!(f, "{v}"),
            CellValue::Text(v) => write!(f, "{v}"),
            CellValue::IntegerList(v) => write!(f, "{v:?}"),
            CellValue::RealList(v) => write!(f, "{v:?}"),
        }
    }
}

/// A [`CellValue`] paired with the moment it was assigned — the unit
/// actually stored in a [`crate::ColumnData`] map.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimedValue {
    pub value: CellValue,
    pub at: DateTime<Utc>,
}

impl TimedValue {
    pub fn new(value: CellValue, at: DateTime<Utc>) -> Self {
        Self { value, at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(CellValue::Integer(1).kind(), CellKind::Integer);
        assert_eq!(CellValue::RealList(vec![1.0]).kind(), CellKind::RealList);
    }

    #[test]
    fn as_f64_widens_numeric_kinds_only() {
        assert_eq!(CellValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(CellValue::Real(2.5).as_f64(), Some(2.5));
        assert_eq!(CellValue::Boolean(true).as_f64(), None);
    }
}
