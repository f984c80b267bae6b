//! Runtime value representation and evaluation context.
//!
//! Formula functions operate on a narrower domain (`Real`/`Boolean`) than
//! the full [`race_tabular::CellValue`] cell model; [`Evaluated`] is that
//! narrower domain, with conversions at the boundary where a cell
//! reference is read or a result is written back.

use race_tabular::{CellKind, CellValue};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluated {
    Real(f64),
    Boolean(bool),
}

impl Evaluated {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Evaluated::Real(v) => Some(*v),
            Evaluated::Boolean(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Evaluated::Boolean(v) => Some(*v),
            Evaluated::Real(_) => None,
        }
    }

    pub fn from_cell_value(value: &CellValue) -> Option<Evaluated> {
        match value {
            CellValue::Integer(i) => Some(Evaluated::Real(*i as f64)),
            CellValue::Real(r) => Some(Evaluated::Real(*r)),
            CellValue::Boolean(b) => Some(Evaluated::Boolean(*b)),
            CellValue::Text(_) | CellValue::IntegerList(_) | CellValue::RealList(_) => None,
        }
    }

    /// Coerces into the cell value the target row's declared kind expects.
    /// The compiler already proved `self`'s shape agrees with `kind`.
    pub fn into_cell_value(self, kind: CellKind) -> CellValue {
        match (self, kind) {
            (Evaluated::Real(v), CellKind::Integer) => CellValue::Integer(v as i64),
            (Evaluated::Real(v), _) => CellValue::Real(v),
            (Evaluated::Boolean(v), _) => CellValue::Boolean(v),
        }
    }
}

/// Exposes cell values by `(column, row)` plus the current change date, as
/// required by the formula language's evaluation semantics.
pub trait EvalContext {
    fn cell_value(&self, column: &str, row: &str) -> Option<&CellValue>;
    fn current_change_date(&self) -> chrono::DateTime<chrono::Utc>;
    /// Prior value of the cell the formula being evaluated is attached to,
    /// used by `Acc`.
    fn previous_value_of_current_cell(&self) -> Option<&CellValue>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widens_integer_and_real_to_evaluated_real() {
        assert_eq!(Evaluated::from_cell_value(&CellValue::Integer(3)), Some(Evaluated::Real(3.0)));
        assert_eq!(Evaluated::from_cell_value(&CellValue::Real(2.5)), Some(Evaluated::Real(2.5)));
    }

    #[test]
    fn text_and_lists_are_not_representable() {
        assert_eq!(Evaluated::from_cell_value(&CellValue::Text("x".into())), None);
    }

    #[test]
    fn into_cell_value_narrows_real_to_integer_kind() {
        assert_eq!(Evaluated::Real(3.7).into_cell_value(CellKind::Integer), CellValue::Integer(3));
        assert_eq!(Evaluated::Real(3.7).into_cell_value(CellKind::Real), CellValue::Real(3.7));
    }
}
