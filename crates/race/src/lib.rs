//! Meta crate that re-exports the RACE sub-crates with sensible defaults.
//! Downstream users can depend on this crate and opt into specific layers
//! via feature flags while keeping access to the underlying crates when
//! deeper integration is required.

#[cfg(feature = "common")]
pub use race_common as common;

#[cfg(feature = "parse")]
pub use race_parse as parse;

#[cfg(feature = "wire")]
pub use race_wire as wire;

#[cfg(feature = "tabular")]
pub use race_tabular as tabular;

#[cfg(feature = "formula")]
pub use race_formula as formula;

#[cfg(feature = "engine")]
pub use race_engine as engine;

#[cfg(feature = "config")]
pub use race_config as config;

#[cfg(feature = "common")]
pub use race_common::{GlobPath, Slice};

#[cfg(feature = "tabular")]
pub use race_tabular::{CellKind, CellValue, ColumnDataChange, Node};

#[cfg(feature = "engine")]
pub use race_engine::{Engine, SharedEngine, UpdateResult};

#[cfg(feature = "config")]
pub use race_config::{Config, CredentialStore};
