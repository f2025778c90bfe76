pub mod aggregate;
pub mod error;
pub mod fill;
pub mod model;
mod persist;
pub mod reconcile;
pub mod store;
pub mod structure;
pub mod versions;

pub type Decimal = rust_decimal::Decimal;

pub use aggregate::{AggregateRequest, SectionAggregate, aggregate_section};
pub use error::ReconcileError;
pub use fill::{FillReport, FillRequest, fill_forecast};
pub use model::{LineItem, Month, MonthValues, RowType, StatementRef, StatementScope, Version};
pub use store::{MemoryStore, StatementStore};
pub use structure::{CopyReport, CopyRequest, copy_structure};
