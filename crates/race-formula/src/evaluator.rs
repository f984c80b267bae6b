//! Walks a compiled [`CompiledExpr`] tree against an [`EvalContext`].
//! Returns `None` the instant any dependency is missing, per the
//! "formula returns `None` if any dependency is missing" semantics.

use smallvec::SmallVec;

use crate::compiler::{CellExpression, CompiledExpr};
use crate::eval::{EvalContext, Evaluated};

pub fn evaluate(compiled: &CellExpression, ctx: &dyn EvalContext) -> Option<Evaluated> {
    eval_expr(&compiled.expr, ctx)
}

fn eval_expr(expr: &CompiledExpr, ctx: &dyn EvalContext) -> Option<Evaluated> {
    match expr {
        CompiledExpr::Number(n) => Some(Evaluated::Real(*n)),
        CompiledExpr::Bool(b) => Some(Evaluated::Boolean(*b)),
        CompiledExpr::Ref(col, row, _) => {
            let value = ctx.cell_value(col.as_str(), row.as_str())?;
            Evaluated::from_cell_value(value)
        }
        CompiledExpr::Acc => {
            let value = ctx.previous_value_of_current_cell()?;
            Evaluated::from_cell_value(value)
        }
        CompiledExpr::Call(spec, args) => {
            let values = args
                .iter()
                .map(|a| eval_expr(a, ctx))
                .collect::<Option<SmallVec<[Evaluated; 4]>>>()?;
            (spec.eval)(&values)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile;
    use race_tabular::{CellKind, CellValue, Column, ColumnId, ColumnList, Row, RowId, RowList, UpdateFilterSpec};
    use std::collections::HashMap;

    struct FakeContext {
        cells: HashMap<(String, String), CellValue>,
        previous: Option<CellValue>,
    }

    impl EvalContext for FakeContext {
        fn cell_value(&self, column: &str, row: &str) -> Option<&CellValue> {
            self.cells.get(&(column.to_string(), row.to_string()))
        }
        fn current_change_date(&self) -> chrono::DateTime<chrono::Utc> {
            chrono::Utc::now()
        }
        fn previous_value_of_current_cell(&self) -> Option<&CellValue> {
            self.previous.as_ref()
        }
    }

    fn columns() -> ColumnList {
        ColumnList {
            columns: vec![
                Column { id: ColumnId::from("/c1"), owner_node: "n".into(), update_filter: UpdateFilterSpec::default() },
                Column { id: ColumnId::from("/c2"), owner_node: "n".into(), update_filter: UpdateFilterSpec::default() },
            ],
        }
    }

    fn rows() -> RowList {
        RowList::new(vec![Row {
            id: RowId::from("/r1"),
            kind: CellKind::Real,
            attrs: vec![],
            formula: None,
            min: None,
            max: None,
        }])
    }

    #[test]
    fn evaluates_sum_of_resolved_references() {
        let compiled = compile(
            "(Sum ../c{1,2}::.)",
            &ColumnId::from("/c3"),
            &RowId::from("/r1"),
            CellKind::Real,
            &columns(),
            &rows(),
        )
        .unwrap();
        let mut cells = HashMap::new();
        cells.insert(("/c1".to_string(), "/r1".to_string()), CellValue::Real(2.0));
        cells.insert(("/c2".to_string(), "/r1".to_string()), CellValue::Real(3.0));
        let ctx = FakeContext { cells, previous: None };
        assert_eq!(evaluate(&compiled, &ctx), Some(Evaluated::Real(5.0)));
    }

    #[test]
    fn missing_dependency_yields_none() {
        let compiled = compile(
            "(Sum /c1::/r1)",
            &ColumnId::from("/c1"),
            &RowId::from("/r1"),
            CellKind::Real,
            &columns(),
            &rows(),
        )
        .unwrap();
        let ctx = FakeContext { cells: HashMap::new(), previous: None };
        assert_eq!(evaluate(&compiled, &ctx), None);
    }

    #[test]
    fn acc_reads_previous_value_of_current_cell() {
        let compiled = compile(
            "(Acc 0)",
            &ColumnId::from("/c1"),
            &RowId::from("/r1"),
            CellKind::Real,
            &columns(),
            &rows(),
        )
        .unwrap();
        let ctx = FakeContext { cells: HashMap::new(), previous: Some(CellValue::Real(9.0)) };
        assert_eq!(evaluate(&compiled, &ctx), Some(Evaluated::Real(9.0)));
    }
}
