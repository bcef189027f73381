pub mod derive;
pub mod reconcile;
pub mod schema;

pub use reconcile::{reconcile, FieldSet, FieldValue, LogicalField, PageSnapshot, WriteOp};
pub use schema::{ensure_options, ColumnKind, ResolvedSchema};
