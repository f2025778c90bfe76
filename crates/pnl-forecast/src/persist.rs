//! Batched writes to a [`StatementStore`].
//!
//! Batches are independent: a failure stops the remaining writes but leaves the
//! ones already applied in place.

use anyhow::Result;
use futures::{StreamExt as _, TryStreamExt as _, stream};

use crate::model::{NewLineItem, RowId, RowPatch, StatementRef};
use crate::store::StatementStore;

pub(crate) const MAX_CONCURRENT_UPDATES: usize = 10;
pub(crate) const INSERT_BATCH_SIZE: usize = 100;

pub(crate) async fn update_fields<S: StatementStore>(
    store: &S,
    patches: &[RowPatch],
) -> Result<()> {
    let updates: Vec<_> = patches
        .iter()
        .map(|patch| store.update_row_fields(patch.row_id, patch))
        .collect();
    stream::iter(updates)
        .buffer_unordered(MAX_CONCURRENT_UPDATES)
        .try_collect::<()>()
        .await
}

pub(crate) async fn update_orders<S: StatementStore>(
    store: &S,
    reorders: &[(RowId, u32)],
) -> Result<()> {
    let updates: Vec<_> = reorders
        .iter()
        .map(|&(id, order)| store.update_row_order(id, order))
        .collect();
    stream::iter(updates)
        .buffer_unordered(MAX_CONCURRENT_UPDATES)
        .try_collect::<()>()
        .await
}

pub(crate) async fn insert_rows<S: StatementStore>(
    store: &S,
    statement: &StatementRef,
    rows: Vec<NewLineItem>,
) -> Result<usize> {
    let count = rows.len();
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        let batch: Vec<_> = rows.by_ref().take(INSERT_BATCH_SIZE).collect();
        tracing::debug!(%statement, rows = batch.len(), "inserting batch");
        store.insert_rows(statement, batch).await?;
    }
    Ok(count)
}
