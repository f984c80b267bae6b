//! Single-owner update engine: applies column data changes to a node,
//! recomputes dependent formula cells, and tracks bounds-constraint
//! transitions. A node's engine is meant to be wrapped in a
//! [`parking_lot::Mutex`] by whatever owns it, since only one update is
//! ever in flight at a time.

mod constraint;
mod engine;
mod error;

pub use constraint::{ConstraintChange, ConstraintTracker};
pub use engine::{compile_engine, Engine, SharedEngine, UpdateResult};
pub use error::EngineError;
