//! Copying a version's row layout into another statement without its values.

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::fill::{Statements, load_statements};
use crate::model::{LineItem, MonthValues, NewLineItem, StatementScope, VersionId};
use crate::persist;
use crate::reconcile::{match_rows, plan_merge};
use crate::store::StatementStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyRequest {
    pub branch_id: String,
    pub department: String,
    pub year: i32,
    pub source_version_id: VersionId,
    #[serde(default)]
    pub target_version_id: Option<VersionId>,
}

impl CopyRequest {
    pub fn scope(&self) -> StatementScope {
        StatementScope::new(&self.branch_id, &self.department, self.year)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyReport {
    pub inserted_count: usize,
    pub reordered_count: usize,
}

/// Give the target every row of the source's layout, with zero values.
///
/// An empty target receives a copy of every source row. Otherwise only source detail
/// rows with no counterpart are inserted, and existing rows keep their values.
pub async fn copy_structure<S: StatementStore>(
    store: &S,
    request: &CopyRequest,
) -> Result<CopyReport, ReconcileError> {
    let Statements {
        target,
        source_rows,
        ..
    } = load_statements(
        store,
        &request.scope(),
        request.source_version_id,
        request.target_version_id,
    )
    .await?;

    let target_rows = store.list_rows(&target, None).await?;
    let report = if target_rows.is_empty() {
        let rows = blank_copy(&source_rows);
        CopyReport {
            inserted_count: persist::insert_rows(store, &target, rows).await?,
            reordered_count: 0,
        }
    } else {
        let matches = match_rows(&source_rows, &target_rows);
        let plan = plan_merge(&source_rows, &matches.consumed, target_rows, &[]);
        persist::update_orders(store, &plan.reorders).await?;
        let reordered_count = plan.reorders.len();
        CopyReport {
            inserted_count: persist::insert_rows(store, &target, plan.into_inserted()).await?,
            reordered_count,
        }
    };

    tracing::info!(
        %target,
        source_version = request.source_version_id,
        inserted = report.inserted_count,
        reordered = report.reordered_count,
        "copied structure"
    );
    Ok(report)
}

fn blank_copy(source: &[LineItem]) -> Vec<NewLineItem> {
    source
        .iter()
        .zip(1..)
        .map(|(row, order)| NewLineItem {
            row_order: order,
            months: MonthValues::default(),
            ..row.to_new()
        })
        .collect()
}
