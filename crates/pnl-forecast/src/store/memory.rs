use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use super::StatementStore;
use crate::model::{
    ImportRecord, LineItem, NewLineItem, NewVersion, RowId, RowPatch, RowType, StatementRef,
    StatementScope, Version, VersionId,
};

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Tables {
    rows: Vec<LineItem>,
    versions: Vec<Version>,
    imports: Vec<ImportRecord>,
}

/// A [`StatementStore`] held in memory, optionally backed by a JSON file.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Load the snapshot at `path`, or start empty if there is none yet.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No data file at {}, starting empty", path.display());
            return Ok(MemoryStore::new());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read data file: {}", path.display()))?;
        let tables: Tables = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse data file: {}", path.display()))?;
        tracing::debug!(
            rows = tables.rows.len(),
            versions = tables.versions.len(),
            "Loaded {}",
            path.display()
        );

        Ok(MemoryStore {
            tables: Mutex::new(tables),
        })
    }

    /// Write a snapshot of every table to `path`.
    ///
    /// The tables stay locked until the file is written, so concurrent saves land in
    /// the order their snapshots were taken.
    pub fn save(&self, path: &Path) -> Result<()> {
        let tables = self.tables()?;
        let contents = serde_json::to_string_pretty(&*tables)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write data file: {}", path.display()))?;
        Ok(())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| anyhow!("statement tables are poisoned"))
    }
}

impl StatementStore for MemoryStore {
    async fn list_rows(
        &self,
        statement: &StatementRef,
        row_type: Option<RowType>,
    ) -> Result<Vec<LineItem>> {
        let tables = self.tables()?;
        let mut rows: Vec<LineItem> = tables
            .rows
            .iter()
            .filter(|row| &row.statement == statement)
            .filter(|row| row_type.is_none_or(|row_type| row.row_type == row_type))
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.row_order);
        Ok(rows)
    }

    async fn list_versions(&self, scope: &StatementScope) -> Result<Vec<Version>> {
        let tables = self.tables()?;
        let mut versions: Vec<Version> = tables
            .versions
            .iter()
            .filter(|version| &version.scope == scope)
            .cloned()
            .collect();
        versions.sort_by_key(|version| version.id);
        Ok(versions)
    }

    async fn get_version(&self, id: VersionId) -> Result<Option<Version>> {
        let tables = self.tables()?;
        Ok(tables.versions.iter().find(|version| version.id == id).cloned())
    }

    async fn update_row_fields(&self, id: RowId, patch: &RowPatch) -> Result<()> {
        let mut tables = self.tables()?;
        let row = tables
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .with_context(|| format!("row {id} not found"))?;
        patch.apply_to(row);
        Ok(())
    }

    async fn insert_rows(&self, statement: &StatementRef, rows: Vec<NewLineItem>) -> Result<()> {
        let mut tables = self.tables()?;
        let mut next_id: RowId = tables.rows.iter().map(|row| row.id).max().unwrap_or(0);
        for row in rows {
            next_id += 1;
            tables
                .rows
                .push(row.into_line_item(next_id, statement.clone()));
        }
        Ok(())
    }

    async fn update_row_order(&self, id: RowId, order: u32) -> Result<()> {
        let mut tables = self.tables()?;
        let row = tables
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .with_context(|| format!("row {id} not found"))?;
        row.row_order = order;
        Ok(())
    }

    async fn get_import_record(&self, scope: &StatementScope) -> Result<Option<ImportRecord>> {
        let tables = self.tables()?;
        Ok(tables
            .imports
            .iter()
            .find(|record| &record.scope == scope)
            .cloned())
    }

    async fn create_version(&self, version: NewVersion) -> Result<Version> {
        let mut tables = self.tables()?;
        let id = tables.versions.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        let version = Version {
            id,
            scope: version.scope,
            version_name: version.version_name,
            actual_months: version.actual_months,
            is_locked: false,
            locked_at: None,
            notes: version.notes,
        };
        tables.versions.push(version.clone());
        Ok(version)
    }

    async fn put_version(&self, version: &Version) -> Result<()> {
        let mut tables = self.tables()?;
        let Some(existing) = tables.versions.iter_mut().find(|v| v.id == version.id) else {
            bail!("version {} not found", version.id);
        };
        *existing = version.clone();
        Ok(())
    }

    async fn delete_version(&self, id: VersionId) -> Result<()> {
        let mut tables = self.tables()?;
        let before = tables.versions.len();
        tables.versions.retain(|version| version.id != id);
        if tables.versions.len() == before {
            bail!("version {id} not found");
        }
        Ok(())
    }

    async fn delete_rows(&self, statement: &StatementRef) -> Result<()> {
        let mut tables = self.tables()?;
        tables.rows.retain(|row| &row.statement != statement);
        Ok(())
    }

    async fn put_import_record(&self, record: ImportRecord) -> Result<()> {
        let mut tables = self.tables()?;
        match tables.imports.iter_mut().find(|r| r.scope == record.scope) {
            Some(existing) => *existing = record,
            None => tables.imports.push(record),
        }
        Ok(())
    }
}
