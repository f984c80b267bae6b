//! Typed tabular cell model: columns and rows loaded once from JSON
//! definition files, per-column data snapshots, and the column data change
//! deltas nodes exchange to update them.

mod cdc;
mod column_data;
mod definitions;
mod ids;
mod node;
mod schema;
mod value;

pub use cdc::ColumnDataChange;
pub use column_data::{ColumnData, ColumnDataError};
pub use definitions::{
    load_cdc, load_column_data, load_column_list, load_row_list, ColumnDataChangeFile,
    ColumnDataFile, ColumnListFile, DefinitionError, FormulaListFile, RowListFile,
};
pub use ids::{ColumnId, NodeId, RowId};
pub use node::{Node, NodeError};
pub use schema::{Column, ColumnList, Row, RowAttr, RowList, UpdateFilterEntry, UpdateFilterSpec};
pub use value::{CellKind, CellValue, TimedValue};
