//! Saving, locking and deleting versions, and recording draft imports.

use chrono::Utc;

use crate::error::ReconcileError;
use crate::fill::require_version;
use crate::model::{
    ImportRecord, Month, NewLineItem, NewVersion, StatementScope, Version, VersionId,
};
use crate::persist;
use crate::store::StatementStore;

/// Snapshot the draft of `scope` as a new version, renumbering rows `1..=N`.
pub async fn save_version<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    version_name: &str,
    actual_months: u8,
    notes: Option<String>,
) -> Result<Version, ReconcileError> {
    if actual_months > 12 {
        return Err(ReconcileError::InvalidActualMonths(actual_months.into()));
    }
    let draft = store.list_rows(&scope.draft(), None).await?;

    let version = store
        .create_version(NewVersion {
            scope: scope.clone(),
            version_name: version_name.to_owned(),
            actual_months,
            notes,
        })
        .await?;
    let rows = draft
        .iter()
        .zip(1..)
        .map(|(row, order)| NewLineItem {
            row_order: order,
            ..row.to_new()
        })
        .collect();
    let copied = persist::insert_rows(store, &version.statement(), rows).await?;

    tracing::info!(
        version = version.id,
        name = %version.version_name,
        rows = copied,
        "saved draft of {scope}"
    );
    Ok(version)
}

pub async fn set_locked<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    id: VersionId,
    locked: bool,
) -> Result<Version, ReconcileError> {
    let mut version = require_version(store, scope, id).await?;
    version.is_locked = locked;
    version.locked_at = locked.then(Utc::now);
    store.put_version(&version).await?;
    tracing::info!(version = id, locked, "changed version lock");
    Ok(version)
}

pub async fn set_notes<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    id: VersionId,
    notes: Option<String>,
) -> Result<Version, ReconcileError> {
    let mut version = require_version(store, scope, id).await?;
    version.notes = notes;
    store.put_version(&version).await?;
    Ok(version)
}

/// Delete a version and its rows. Locked versions are kept.
pub async fn delete_version<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    id: VersionId,
) -> Result<(), ReconcileError> {
    let version = require_version(store, scope, id).await?;
    if version.is_locked {
        return Err(ReconcileError::VersionLocked(id));
    }
    store.delete_rows(&version.statement()).await?;
    store.delete_version(id).await?;
    tracing::info!(version = id, "deleted version from {scope}");
    Ok(())
}

/// Record which months of the draft hold imported actuals.
pub async fn record_import<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    file_name: &str,
    mut months_included: Vec<Month>,
) -> Result<ImportRecord, ReconcileError> {
    months_included.sort();
    months_included.dedup();

    let record = ImportRecord {
        scope: scope.clone(),
        file_name: file_name.to_owned(),
        months_included,
        imported_at: Utc::now(),
    };
    store.put_import_record(record.clone()).await?;
    tracing::debug!(file = file_name, months = record.months_included.len(), "recorded import");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MonthValues, RowType};
    use crate::reconcile::testing::{WithMonth, detail, header, scope};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    async fn store_with_draft() -> MemoryStore {
        let store = MemoryStore::new();
        let rows = vec![
            NewLineItem {
                row_order: 1,
                ..header("Income").to_new()
            },
            NewLineItem {
                row_order: 2,
                ..detail("Mowing", Some("4100"))
                    .with(Month::Mar, dec!(12.5))
                    .to_new()
            },
        ];
        store.insert_rows(&scope().draft(), rows).await.unwrap();
        store
    }

    #[tokio::test]
    async fn saved_version_copies_the_draft() {
        let store = store_with_draft().await;

        let version = save_version(&store, &scope(), "3+9", 3, Some("spring".to_owned()))
            .await
            .unwrap();
        assert_eq!(version.actual_months, 3);
        assert!(!version.is_locked);

        let rows = store.list_rows(&version.statement(), None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_type, RowType::SectionHeader);
        assert_eq!(rows[1].row_order, 2);
        assert_eq!(rows[1].months, MonthValues::default().with(Month::Mar, dec!(12.5)));

        // the draft stays its own statement
        store.update_row_order(rows[1].id, 9).await.unwrap();
        let draft = store.list_rows(&scope().draft(), None).await.unwrap();
        assert_eq!(draft[1].row_order, 2);

        let err = save_version(&store, &scope(), "bad", 13, None).await.unwrap_err();
        assert!(matches!(err, ReconcileError::InvalidActualMonths(13)));
    }

    #[tokio::test]
    async fn saved_version_closes_row_order_gaps() {
        let store = store_with_draft().await;
        let mut trailing = detail("Trimming", Some("4200")).to_new();
        trailing.row_order = 7;
        store
            .insert_rows(&scope().draft(), vec![trailing])
            .await
            .unwrap();

        let version = save_version(&store, &scope(), "Budget", 0, None).await.unwrap();
        let rows = store.list_rows(&version.statement(), None).await.unwrap();
        let orders: Vec<_> = rows.iter().map(|row| row.row_order).collect();
        assert_eq!(orders, [1, 2, 3]);
        assert_eq!(rows[2].account_name, "Trimming");

        let draft = store.list_rows(&scope().draft(), None).await.unwrap();
        assert_eq!(draft[2].row_order, 7);
    }

    #[tokio::test]
    async fn locking_stamps_and_blocks_deletion() {
        let store = store_with_draft().await;
        let version = save_version(&store, &scope(), "Budget", 0, None).await.unwrap();

        let locked = set_locked(&store, &scope(), version.id, true).await.unwrap();
        assert!(locked.is_locked);
        assert!(locked.locked_at.is_some());

        let err = delete_version(&store, &scope(), version.id).await.unwrap_err();
        assert!(matches!(err, ReconcileError::VersionLocked(_)));

        let unlocked = set_locked(&store, &scope(), version.id, false).await.unwrap();
        assert_eq!(unlocked.locked_at, None);

        let noted = set_notes(&store, &scope(), version.id, Some("final".to_owned()))
            .await
            .unwrap();
        assert_eq!(noted.notes.as_deref(), Some("final"));

        delete_version(&store, &scope(), version.id).await.unwrap();
        assert_eq!(store.get_version(version.id).await.unwrap(), None);
        assert!(store.list_rows(&version.statement(), None).await.unwrap().is_empty());
        assert_eq!(store.list_rows(&scope().draft(), None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn versions_of_another_scope_are_not_found() {
        let store = store_with_draft().await;
        let version = save_version(&store, &scope(), "Budget", 0, None).await.unwrap();

        let other = StatementScope::new("south", "maintenance", 2025);
        let err = set_locked(&store, &other, version.id, true).await.unwrap_err();
        assert_eq!(err.to_string(), "version 1 not found in south/maintenance/2025");
    }

    #[tokio::test]
    async fn import_record_is_replaced() {
        let store = MemoryStore::new();
        record_import(&store, &scope(), "jan.csv", vec![Month::Jan]).await.unwrap();
        let months = vec![Month::Mar, Month::Jan, Month::Feb, Month::Jan];
        let record = record_import(&store, &scope(), "q1.csv", months).await.unwrap();
        assert_eq!(record.months_included, [Month::Jan, Month::Feb, Month::Mar]);

        let stored = store.get_import_record(&scope()).await.unwrap().unwrap();
        assert_eq!(stored.file_name, "q1.csv");
    }
}
