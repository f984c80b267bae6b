//! Error taxonomy for the update engine. Permission, kind and timestamp
//! failures surface from [`race_tabular::NodeError`] during `apply`;
//! everything here is specific to orchestration above that layer.

use race_formula::ProgramError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("formula program failed to compile: {0}")]
    Program(#[from] ProgramError),
}
