//! Three-pass compiler: lex/parse, resolve references, build a typed
//! [`CellExpression`]. All failures are compile-time (spec 4.G pass 3);
//! there is no runtime arity or kind checking.

use std::fmt;

use race_tabular::{CellKind, ColumnId, ColumnList, RowId, RowList};
use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::ast::{self, Expr, RefPattern};
use crate::reference;
use crate::registry::{self, Arity, ArgKinds, FunctionSpec};

#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown function {name:?}")]
    UnknownFunction { name: String },
    #[error("{name} expects {expected:?} arguments, got {got}")]
    ArityMismatch { name: String, expected: Arity, got: usize },
    #[error("reference {column}::{row} does not match any known cell")]
    UnresolvedReference { column: String, row: String },
    #[error("reference {column}::{row} resolves to column {resolved_column} with kind {actual:?}, expected {expected:?}")]
    ArgKindMismatch {
        column: String,
        row: String,
        resolved_column: String,
        expected: CellKind,
        actual: CellKind,
    },
    #[error("result kind {actual:?} does not match the row's declared kind {expected:?}")]
    ResultKindMismatch { expected: CellKind, actual: CellKind },
}

impl fmt::Debug for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

impl From<ast::ParseError> for CompileError {
    fn from(e: ast::ParseError) -> Self {
        CompileError::Syntax(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompiledExpr {
    Number(f64),
    Bool(bool),
    /// A resolved cell reference. The `CellKind` is the referenced row's
    /// declared kind, carried so argument-kind checking at a call site
    /// doesn't have to re-resolve the reference.
    Ref(ColumnId, RowId, CellKind),
    Acc,
    Call(&'static FunctionSpec, Vec<CompiledExpr>),
}

impl fmt::Display for CompiledExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledExpr::Number(n) => write!(f, "{n}"),
            CompiledExpr::Bool(b) => write!(f, "{b}"),
            CompiledExpr::Ref(c, r, _) => write!(f, "{c}::{r}"),
            CompiledExpr::Acc => write!(f, "acc"),
            CompiledExpr::Call(spec, args) => {
                write!(f, "({}", spec.name)?;
                for a in args {
                    write!(f, " {a}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A compiled formula: its typed expression tree plus the dependency set
/// patterns expanded to at compile time.
#[derive(Debug, Clone, PartialEq)]
pub struct CellExpression {
    pub expr: CompiledExpr,
    pub result_kind: CellKind,
    pub dependencies: FxHashSet<(ColumnId, RowId)>,
}

pub fn compile(
    source: &str,
    current_column: &ColumnId,
    current_row: &RowId,
    target_kind: CellKind,
    columns: &ColumnList,
    rows: &RowList,
) -> Result<CellExpression, CompileError> {
    let ast = ast::parse(source)?;
    let mut deps = FxHashSet::default();
    let compiled = resolve(&ast, current_column, current_row, columns, rows, &mut deps)?;
    let result_kind = result_kind_of(&compiled);
    if result_kind != target_kind {
        return Err(CompileError::ResultKindMismatch { expected: target_kind, actual: result_kind });
    }
    Ok(CellExpression { expr: compiled, result_kind, dependencies: deps })
}

fn result_kind_of(expr: &CompiledExpr) -> CellKind {
    match expr {
        CompiledExpr::Number(_) => CellKind::Real,
        CompiledExpr::Bool(_) => CellKind::Boolean,
        CompiledExpr::Ref(_, _, kind) => *kind,
        CompiledExpr::Acc => CellKind::Real,
        CompiledExpr::Call(spec, _) => spec.result_kind,
    }
}

fn resolve(
    expr: &Expr,
    current_column: &ColumnId,
    current_row: &RowId,
    columns: &ColumnList,
    rows: &RowList,
    deps: &mut FxHashSet<(ColumnId, RowId)>,
) -> Result<CompiledExpr, CompileError> {
    match expr {
        Expr::Number(n) => Ok(CompiledExpr::Number(*n)),
        Expr::Bool(b) => Ok(CompiledExpr::Bool(*b)),
        Expr::Ref(pattern) => resolve_single_ref(pattern, current_column, current_row, columns, rows, deps),
        Expr::Call(name, args) => {
            if name == "Acc" {
                // Acc's operand names the cell's own prior value, not a
                // dependency edge — it does not widen the dependency set.
                if args.len() != 1 {
                    return Err(CompileError::ArityMismatch {
                        name: name.clone(),
                        expected: Arity::Exact(1),
                        got: args.len(),
                    });
                }
                return Ok(CompiledExpr::Acc);
            }
            let spec = registry::lookup(name)
                .ok_or_else(|| CompileError::UnknownFunction { name: name.clone() })?;
            if !spec.arity.accepts(args.len()) {
                return Err(CompileError::ArityMismatch {
                    name: name.clone(),
                    expected: spec.arity,
                    got: args.len(),
                });
            }
            let compiled_args = args
                .iter()
                .map(|a| resolve(a, current_column, current_row, columns, rows, deps))
                .collect::<Result<Vec<_>, _>>()?;
            check_arg_kinds(spec, &compiled_args)?;
            Ok(CompiledExpr::Call(spec, compiled_args))
        }
    }
}

fn check_arg_kinds(spec: &FunctionSpec, args: &[CompiledExpr]) -> Result<(), CompileError> {
    let expected = match spec.arg_kinds {
        ArgKinds::AllNumeric => CellKind::Real,
        ArgKinds::AllBoolean => CellKind::Boolean,
    };
    for a in args {
        let actual = result_kind_of(a);
        let numeric_ok = expected == CellKind::Real && matches!(actual, CellKind::Real | CellKind::Integer);
        if actual != expected && !numeric_ok {
            if let CompiledExpr::Ref(col, row, _) = a {
                return Err(CompileError::ArgKindMismatch {
                    column: col.to_string(),
                    row: row.to_string(),
                    resolved_column: col.to_string(),
                    expected,
                    actual,
                });
            }
            return Err(CompileError::ResultKindMismatch { expected, actual });
        }
    }
    Ok(())
}

fn resolve_single_ref(
    pattern: &RefPattern,
    current_column: &ColumnId,
    current_row: &RowId,
    columns: &ColumnList,
    rows: &RowList,
    deps: &mut FxHashSet<(ColumnId, RowId)>,
) -> Result<CompiledExpr, CompileError> {
    let column_ids: Vec<&str> = columns.ids().map(|c| c.as_str()).collect();
    let row_ids: Vec<&str> = rows.ids().map(|r| r.as_str()).collect();

    let matched_columns = reference::expand(&pattern.column, current_column.as_str(), column_ids.iter().copied());
    let matched_rows = reference::expand(&pattern.row, current_row.as_str(), row_ids.iter().copied());

    if matched_columns.is_empty() || matched_rows.is_empty() {
        return Err(CompileError::UnresolvedReference {
            column: pattern.column.clone(),
            row: pattern.row.clone(),
        });
    }

    let is_multi_cell = matched_columns.len() * matched_rows.len() > 1;

    let mut resolved = Vec::new();
    for c in &matched_columns {
        let row_kinds = matched_rows
            .iter()
            .map(|r| rows.get(&RowId::from(r.clone())).map(|row| row.kind))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CompileError::UnresolvedReference {
                column: pattern.column.clone(),
                row: pattern.row.clone(),
            })?;
        for (r, kind) in matched_rows.iter().zip(row_kinds) {
            let kind_ok = if is_multi_cell {
                matches!(kind, CellKind::Integer | CellKind::Real)
            } else {
                matches!(kind, CellKind::Integer | CellKind::Real | CellKind::Boolean)
            };
            if !kind_ok {
                return Err(CompileError::ArgKindMismatch {
                    column: pattern.column.clone(),
                    row: pattern.row.clone(),
                    resolved_column: c.clone(),
                    expected: CellKind::Real,
                    actual: kind,
                });
            }
            let col_id = ColumnId::from(c.clone());
            let row_id = RowId::from(r.clone());
            deps.insert((col_id.clone(), row_id.clone()));
            resolved.push((col_id, row_id, kind));
        }
    }

    // A pattern expanding to exactly one cell compiles to a direct
    // reference; a multi-cell match compiles to an implicit `Sum` so the
    // formula still type-checks as a single value.
    if resolved.len() == 1 {
        let (c, r, kind) = resolved.into_iter().next().unwrap();
        Ok(CompiledExpr::Ref(c, r, kind))
    } else {
        let refs = resolved.into_iter().map(|(c, r, kind)| CompiledExpr::Ref(c, r, kind)).collect();
        let spec = registry::lookup("Sum").expect("Sum is always registered");
        Ok(CompiledExpr::Call(spec, refs))
    }
}
