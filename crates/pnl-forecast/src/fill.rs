//! Filling a statement's forecast months from another version of it.

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::model::{LineItem, Month, StatementRef, StatementScope, Version, VersionId};
use crate::persist;
use crate::reconcile;
use crate::store::StatementStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillRequest {
    pub branch_id: String,
    pub department: String,
    pub year: i32,
    pub source_version_id: VersionId,
    /// `None` fills the draft.
    #[serde(default)]
    pub target_version_id: Option<VersionId>,
}

impl FillRequest {
    pub fn scope(&self) -> StatementScope {
        StatementScope::new(&self.branch_id, &self.department, self.year)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub updated_count: usize,
    pub inserted_count: usize,
    pub forecast_months: Vec<Month>,
}

/// Source and target of an operation that passed its preconditions.
pub(crate) struct Statements {
    pub target: StatementRef,
    pub target_version: Option<Version>,
    pub source_rows: Vec<LineItem>,
}

/// Check the target is writable and the source is not empty, then load the source rows.
pub(crate) async fn load_statements<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    source_version_id: VersionId,
    target_version_id: Option<VersionId>,
) -> Result<Statements, ReconcileError> {
    let target_version = match target_version_id {
        Some(id) => Some(require_version(store, scope, id).await?),
        None => None,
    };
    if let Some(version) = &target_version
        && version.is_locked
    {
        return Err(ReconcileError::VersionLocked(version.id));
    }

    let source_version = require_version(store, scope, source_version_id).await?;
    let source_rows = store.list_rows(&source_version.statement(), None).await?;
    if source_rows.is_empty() {
        return Err(ReconcileError::EmptySource(source_version.id));
    }

    let target = match &target_version {
        Some(version) => version.statement(),
        None => scope.draft(),
    };
    Ok(Statements {
        target,
        target_version,
        source_rows,
    })
}

/// The version `id`, which must belong to `scope`.
pub(crate) async fn require_version<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    id: VersionId,
) -> Result<Version, ReconcileError> {
    match store.get_version(id).await? {
        Some(version) if &version.scope == scope => Ok(version),
        _ => Err(ReconcileError::VersionNotFound {
            id,
            scope: scope.clone(),
        }),
    }
}

/// Months of the target that are still forecast.
async fn forecast_months<S: StatementStore>(
    store: &S,
    scope: &StatementScope,
    target_version: Option<&Version>,
) -> Result<&'static [Month], ReconcileError> {
    let actual_months = match target_version {
        Some(version) => usize::from(version.actual_months),
        None => store
            .get_import_record(scope)
            .await?
            .map_or(0, |record| record.months_included.len()),
    };
    Month::forecast(actual_months).ok_or(ReconcileError::InvalidActualMonths(actual_months))
}

/// Copy the source version's forecast months into the target statement.
///
/// Matched rows take the source's values, unmatched source detail rows are inserted
/// into their section and every total is recomputed. Value changes are written first,
/// then row order changes, then new rows.
pub async fn fill_forecast<S: StatementStore>(
    store: &S,
    request: &FillRequest,
) -> Result<FillReport, ReconcileError> {
    let scope = request.scope();
    let Statements {
        target,
        target_version,
        source_rows,
    } = load_statements(
        store,
        &scope,
        request.source_version_id,
        request.target_version_id,
    )
    .await?;

    let forecast = forecast_months(store, &scope, target_version.as_ref()).await?;
    if forecast.is_empty() {
        tracing::info!(%target, "all months are actual, nothing to fill");
        return Ok(FillReport::default());
    }

    let target_rows = store.list_rows(&target, None).await?;
    let result = reconcile::reconcile(&source_rows, target_rows, forecast);
    tracing::debug!(
        %target,
        matched = result.matched,
        totals = result.recalculated,
        "reconciled statement"
    );

    persist::update_fields(store, &result.patches).await?;
    persist::update_orders(store, &result.plan.reorders).await?;
    let inserted_count = persist::insert_rows(store, &target, result.plan.into_inserted()).await?;

    let report = FillReport {
        updated_count: result.patches.len(),
        inserted_count,
        forecast_months: forecast.to_vec(),
    };
    tracing::info!(
        %target,
        source_version = request.source_version_id,
        updated = report.updated_count,
        inserted = report.inserted_count,
        "filled forecast"
    );
    Ok(report)
}
