//! Whole-node formula compilation: compiles every row's formula against
//! the node's schema and orders the resulting computed cells
//! topologically by dependency, detecting cycles at compile time (spec
//! 4.G: "cycle detection at compile time prevents cyclic formulas from
//! being accepted").

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

use race_tabular::{ColumnId, ColumnList, FormulaListFile, RowId, RowList};

use crate::compiler::{compile, CellExpression, CompileError};

pub type CellKey = (ColumnId, RowId);

#[derive(Debug, Error)]
pub enum ProgramError {
    #[error("formula at {column}::{row} failed to compile: {source}")]
    Compile { column: ColumnId, row: RowId, #[source] source: CompileError },
    #[error("cyclic formula dependency among cells: {0:?}")]
    Cycle(Vec<CellKey>),
}

/// Every successfully compiled formula plus an evaluation order in which
/// no cell precedes a cell it depends on.
#[derive(Debug)]
pub struct CompiledProgram {
    pub formulas: FxHashMap<CellKey, CellExpression>,
    pub order: Vec<CellKey>,
}

pub fn compile_program(
    columns: &ColumnList,
    rows: &RowList,
    formula_list: &FormulaListFile,
) -> Result<CompiledProgram, ProgramError> {
    let mut formulas = FxHashMap::default();

    for (column_str, per_row) in formula_list {
        let column_id = ColumnId::from(column_str.clone());
        for (row_str, source) in per_row {
            let row_id = RowId::from(row_str.clone());
            let Some(row) = rows.get(&row_id) else { continue };
            let compiled = compile(source, &column_id, &row_id, row.kind, columns, rows)
                .map_err(|e| ProgramError::Compile { column: column_id.clone(), row: row_id.clone(), source: e })?;
            formulas.insert((column_id.clone(), row_id), compiled);
        }
    }

    let order = topological_order(&formulas)?;
    Ok(CompiledProgram { formulas, order })
}

fn topological_order(
    formulas: &FxHashMap<CellKey, CellExpression>,
) -> Result<Vec<CellKey>, ProgramError> {
    let computed: FxHashSet<&CellKey> = formulas.keys().collect();

    let mut in_degree: FxHashMap<CellKey, usize> = FxHashMap::default();
    let mut dependents: FxHashMap<CellKey, Vec<CellKey>> = FxHashMap::default();

    for (cell, expr) in formulas {
        let computed_deps: Vec<&CellKey> =
            expr.dependencies.iter().filter(|d| computed.contains(d)).collect();
        in_degree.insert(cell.clone(), computed_deps.len());
        for dep in computed_deps {
            dependents.entry(dep.clone()).or_default().push(cell.clone());
        }
    }

    let mut ready: Vec<CellKey> =
        in_degree.iter().filter(|(_, &d)| d == 0).map(|(k, _)| k.clone()).collect();
    ready.sort();

    let mut order = Vec::with_capacity(formulas.len());
    let mut queue = std::collections::VecDeque::from(ready);
    while let Some(cell) = queue.pop_front() {
        order.push(cell.clone());
        if let Some(deps) = dependents.get(&cell) {
            for d in deps {
                let entry = in_degree.get_mut(d).unwrap();
                *entry -= 1;
                if *entry == 0 {
                    queue.push_back(d.clone());
                }
            }
        }
    }

    if order.len() != formulas.len() {
        let remaining: Vec<CellKey> =
            in_degree.into_iter().filter(|(_, d)| *d > 0).map(|(k, _)| k).collect();
        return Err(ProgramError::Cycle(remaining));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use race_tabular::{CellKind, Column, Row, UpdateFilterSpec};
    use std::collections::HashMap;

    fn columns() -> ColumnList {
        ColumnList {
            columns: vec![Column {
                id: ColumnId::from("/c1"),
                owner_node: "n".into(),
                update_filter: UpdateFilterSpec::default(),
            }],
        }
    }

    fn rows() -> RowList {
        RowList::new(vec![
            Row { id: RowId::from("/r1"), kind: CellKind::Real, attrs: vec![], formula: None, min: None, max: None },
            Row { id: RowId::from("/r2"), kind: CellKind::Real, attrs: vec![], formula: Some("(Sum /c1::/r1)".into()), min: None, max: None },
        ])
    }

    #[test]
    fn orders_dependent_cell_after_its_dependency() {
        let mut per_col = HashMap::new();
        per_col.insert("/r2".to_string(), "(Sum /c1::/r1)".to_string());
        let mut formula_list = HashMap::new();
        formula_list.insert("/c1".to_string(), per_col);

        let program = compile_program(&columns(), &rows(), &formula_list).unwrap();
        assert_eq!(program.order, vec![(ColumnId::from("/c1"), RowId::from("/r2"))]);
    }

    #[test]
    fn direct_self_cycle_is_rejected() {
        let rows = RowList::new(vec![Row {
            id: RowId::from("/r1"),
            kind: CellKind::Real,
            attrs: vec![],
            formula: Some("(Sum /c1::/r1)".into()),
            min: None,
            max: None,
        }]);
        let mut per_col = HashMap::new();
        per_col.insert("/r1".to_string(), "(Sum /c1::/r1)".to_string());
        let mut formula_list = HashMap::new();
        formula_list.insert("/c1".to_string(), per_col);

        let err = compile_program(&columns(), &rows, &formula_list).unwrap_err();
        assert!(matches!(err, ProgramError::Cycle(_)));
    }
}
