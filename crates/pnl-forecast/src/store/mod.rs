//! Persisted tables behind the reconciler.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;

use anyhow::Result;

use crate::model::{
    ImportRecord, LineItem, NewLineItem, NewVersion, RowId, RowPatch, RowType, StatementRef,
    StatementScope, Version, VersionId,
};

/// Row, version and import tables.
///
/// Every call either fully applies or fails; nothing is atomic across calls.
pub trait StatementStore: Send + Sync {
    /// Rows of one statement sorted by row order, optionally only those of `row_type`.
    fn list_rows(
        &self,
        statement: &StatementRef,
        row_type: Option<RowType>,
    ) -> impl Future<Output = Result<Vec<LineItem>>> + Send;

    fn list_versions(
        &self,
        scope: &StatementScope,
    ) -> impl Future<Output = Result<Vec<Version>>> + Send;

    fn get_version(&self, id: VersionId) -> impl Future<Output = Result<Option<Version>>> + Send;

    fn update_row_fields(
        &self,
        id: RowId,
        patch: &RowPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    fn insert_rows(
        &self,
        statement: &StatementRef,
        rows: Vec<NewLineItem>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn update_row_order(&self, id: RowId, order: u32) -> impl Future<Output = Result<()>> + Send;

    fn get_import_record(
        &self,
        scope: &StatementScope,
    ) -> impl Future<Output = Result<Option<ImportRecord>>> + Send;

    fn create_version(&self, version: NewVersion) -> impl Future<Output = Result<Version>> + Send;

    /// Overwrite the metadata of an existing version.
    fn put_version(&self, version: &Version) -> impl Future<Output = Result<()>> + Send;

    fn delete_version(&self, id: VersionId) -> impl Future<Output = Result<()>> + Send;

    fn delete_rows(&self, statement: &StatementRef) -> impl Future<Output = Result<()>> + Send;

    /// Replace the import record of the record's scope.
    fn put_import_record(&self, record: ImportRecord) -> impl Future<Output = Result<()>> + Send;
}
