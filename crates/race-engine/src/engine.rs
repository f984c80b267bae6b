//! The single-owner update engine: applies an inbound [`ColumnDataChange`]
//! to a [`Node`], recomputes every formula cell whose dependency set was
//! touched (in the compiled program's topological order), re-checks bounds
//! constraints on every cell that changed, and emits the outbound changes
//! grouped back by column.

use chrono::{DateTime, Utc};
use race_formula::{evaluate, CompiledProgram, EvalContext};
use race_tabular::{CellValue, ColumnDataChange, ColumnId, Node, NodeError, RowId};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constraint::{ConstraintChange, ConstraintTracker};
use crate::error::EngineError;

/// Everything that resulted from applying one inbound change: which rows
/// were accepted/rejected by the node's own permission and kind/timestamp
/// checks, the outbound CDCs (one per touched column, including cells
/// that changed only because a formula recomputed), and any constraint
/// state transitions observed along the way.
pub struct UpdateResult {
    pub applied: Vec<RowId>,
    pub rejected: Vec<(RowId, NodeError)>,
    pub outbound: Vec<ColumnDataChange>,
    pub constraint_changes: Vec<ConstraintChange>,
}

struct NodeEvalContext<'a> {
    node: &'a Node,
    current_column: &'a ColumnId,
    current_row: &'a RowId,
    change_date: DateTime<Utc>,
}

impl EvalContext for NodeEvalContext<'_> {
    fn cell_value(&self, column: &str, row: &str) -> Option<&CellValue> {
        self.node
            .column_data(&ColumnId::from(column))?
            .get(&RowId::from(row))
            .map(|tv| &tv.value)
    }

    fn current_change_date(&self) -> DateTime<Utc> {
        self.change_date
    }

    fn previous_value_of_current_cell(&self) -> Option<&CellValue> {
        self.node
            .column_data(self.current_column)?
            .get(self.current_row)
            .map(|tv| &tv.value)
    }
}

pub struct Engine {
    node: Node,
    program: Option<CompiledProgram>,
    constraints: ConstraintTracker,
}

/// A node's single writer: every update to a node's data goes through one
/// `Engine`, one change at a time, so callers share it behind this mutex
/// rather than behind an `Arc<RwLock<_>>` that would let reads race an
/// in-flight recompute.
pub struct SharedEngine(parking_lot::Mutex<Engine>);

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self(parking_lot::Mutex::new(engine))
    }

    pub fn apply(&self, cdc: &ColumnDataChange) -> UpdateResult {
        self.0.lock().apply(cdc)
    }

    pub fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        f(self.0.lock().node())
    }
}

impl Engine {
    pub fn new(node: Node, program: Option<CompiledProgram>) -> Self {
        Self { node, program, constraints: ConstraintTracker::default() }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Applies one inbound change end to end: validation and write-through
    /// happen inside [`Node::apply_cdc`]; everything downstream of that —
    /// dependent recomputation and constraint re-checking — happens here.
    pub fn apply(&mut self, cdc: &ColumnDataChange) -> UpdateResult {
        let (applied, rejected) = self.node.apply_cdc(cdc);

        let mut touched: FxHashMap<ColumnId, Vec<(RowId, CellValue)>> = FxHashMap::default();
        if !applied.is_empty() {
            let mut entries = Vec::new();
            for row_id in &applied {
                if let Some(value) = self
                    .node
                    .column_data(&cdc.target_column)
                    .and_then(|cd| cd.get(row_id))
                {
                    entries.push((row_id.clone(), value.value.clone()));
                }
            }
            touched.insert(cdc.target_column.clone(), entries);
        }

        let mut changed_set: FxHashSet<(ColumnId, RowId)> =
            applied.iter().map(|r| (cdc.target_column.clone(), r.clone())).collect();

        if let Some(program) = &self.program {
            for (column, row) in &program.order {
                let expr = &program.formulas[&(column.clone(), row.clone())];
                if !expr.dependencies.iter().any(|d| changed_set.contains(d)) {
                    continue;
                }
                let ctx = NodeEvalContext {
                    node: &self.node,
                    current_column: column,
                    current_row: row,
                    change_date: cdc.change_timestamp,
                };
                let Some(evaluated) = evaluate(expr, &ctx) else {
                    tracing::warn!(%column, %row, "formula dependency missing at evaluation time, keeping previous value");
                    continue;
                };
                let new_value = evaluated.into_cell_value(expr.result_kind);
                let previous = self.node.column_data(column).and_then(|cd| cd.get(row)).map(|tv| tv.value.clone());
                if previous.as_ref() == Some(&new_value) {
                    continue;
                }
                if let Err(e) = self.node.set_computed_cell(column.clone(), row.clone(), new_value.clone(), cdc.change_timestamp) {
                    tracing::warn!(%column, %row, error = %e, "formula result rejected by its own column invariants");
                    continue;
                }
                changed_set.insert((column.clone(), row.clone()));
                touched.entry(column.clone()).or_default().push((row.clone(), new_value));
            }
        }

        let mut constraint_changes = Vec::new();
        for (column, cells) in &touched {
            for (row_id, value) in cells {
                if let Some(row) = self.node.rows.get(row_id) {
                    if let Some(change) = self.constraints.check(column, row_id, row, value) {
                        constraint_changes.push(change);
                    }
                }
            }
        }

        let outbound = touched
            .into_iter()
            .map(|(column, cells)| {
                let mut change = ColumnDataChange::new(self.node.local_node_id.to_string(), column, cdc.change_timestamp);
                for (row_id, value) in cells {
                    change.push(row_id, value);
                }
                change
            })
            .collect();

        UpdateResult { applied, rejected, outbound, constraint_changes }
    }
}

/// Compiles the node's formula program, surfacing a compile-time cycle or
/// kind error as an [`EngineError`] rather than a later runtime failure.
pub fn compile_engine(
    node: Node,
    formula_list: &race_tabular::FormulaListFile,
) -> Result<Engine, EngineError> {
    let program = race_formula::compile_program(&node.columns, &node.rows, formula_list)?;
    Ok(Engine::new(node, Some(program)))
}
