//! Function library: name → `(arity, argument kinds, result kind,
//! evaluator)`. Arity/kind checking happens at compile time in
//! [`crate::compiler`]; evaluators here assume well-typed, present inputs.

use once_cell::sync::Lazy;
use race_tabular::CellKind;
use rustc_hash::FxHashMap;

use crate::eval::Evaluated;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == *k,
            Arity::AtLeast(k) => n >= *k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKinds {
    /// Every argument must widen to a number (`Integer` or `Real`).
    AllNumeric,
    /// Every argument must be `Boolean`.
    AllBoolean,
}

pub type Evaluator = fn(&[Evaluated]) -> Option<Evaluated>;

#[derive(Debug, PartialEq)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub arity: Arity,
    pub arg_kinds: ArgKinds,
    pub result_kind: CellKind,
    pub eval: Evaluator,
}

fn numeric(values: &[Evaluated]) -> Option<Vec<f64>> {
    values.iter().map(Evaluated::as_f64).collect()
}

fn eval_sum(args: &[Evaluated]) -> Option<Evaluated> {
    Some(Evaluated::Real(numeric(args)?.into_iter().sum()))
}

fn eval_avg(args: &[Evaluated]) -> Option<Evaluated> {
    let v = numeric(args)?;
    if v.is_empty() {
        return None;
    }
    Some(Evaluated::Real(v.iter().sum::<f64>() / v.len() as f64))
}

fn eval_min(args: &[Evaluated]) -> Option<Evaluated> {
    numeric(args)?.into_iter().reduce(f64::min).map(Evaluated::Real)
}

fn eval_max(args: &[Evaluated]) -> Option<Evaluated> {
    numeric(args)?.into_iter().reduce(f64::max).map(Evaluated::Real)
}

fn eval_gt(args: &[Evaluated]) -> Option<Evaluated> {
    let v = numeric(args)?;
    Some(Evaluated::Boolean(v[0] > v[1]))
}

fn eval_lt(args: &[Evaluated]) -> Option<Evaluated> {
    let v = numeric(args)?;
    Some(Evaluated::Boolean(v[0] < v[1]))
}

fn eval_and(args: &[Evaluated]) -> Option<Evaluated> {
    let mut acc = true;
    for a in args {
        acc &= a.as_bool()?;
    }
    Some(Evaluated::Boolean(acc))
}

fn eval_or(args: &[Evaluated]) -> Option<Evaluated> {
    let mut acc = false;
    for a in args {
        acc |= a.as_bool()?;
    }
    Some(Evaluated::Boolean(acc))
}

fn eval_not(args: &[Evaluated]) -> Option<Evaluated> {
    Some(Evaluated::Boolean(!args[0].as_bool()?))
}

pub static REGISTRY: Lazy<FxHashMap<&'static str, FunctionSpec>> = Lazy::new(|| {
    let specs = vec![
        FunctionSpec { name: "Sum", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_sum },
        FunctionSpec { name: "Avg", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_avg },
        // Aliases matching the node-level formula vocabulary: a sum/average
        // always widens its operands to `Real`, regardless of whether the
        // source cells are declared `Integer` or `Real`.
        FunctionSpec { name: "RealSum", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_sum },
        FunctionSpec { name: "IntAvgReal", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_avg },
        FunctionSpec { name: "Min", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_min },
        FunctionSpec { name: "Max", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Real, eval: eval_max },
        FunctionSpec { name: "Gt", arity: Arity::Exact(2), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Boolean, eval: eval_gt },
        FunctionSpec { name: "Lt", arity: Arity::Exact(2), arg_kinds: ArgKinds::AllNumeric, result_kind: CellKind::Boolean, eval: eval_lt },
        FunctionSpec { name: "And", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllBoolean, result_kind: CellKind::Boolean, eval: eval_and },
        FunctionSpec { name: "Or", arity: Arity::AtLeast(1), arg_kinds: ArgKinds::AllBoolean, result_kind: CellKind::Boolean, eval: eval_or },
        FunctionSpec { name: "Not", arity: Arity::Exact(1), arg_kinds: ArgKinds::AllBoolean, result_kind: CellKind::Boolean, eval: eval_not },
    ];
    specs.into_iter().map(|s| (s.name, s)).collect()
});

pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    REGISTRY.get(name)
}
