use crate::model::{StatementScope, VersionId};

/// Failure of a reconciler operation.
///
/// Everything except [`ReconcileError::Store`] is detected before any row is written.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("version {id} not found in {scope}")]
    VersionNotFound { id: VersionId, scope: StatementScope },
    #[error("version {0} is locked")]
    VersionLocked(VersionId),
    #[error("source version {0} has no rows")]
    EmptySource(VersionId),
    #[error("actual months must be between 0 and 12, got {0}")]
    InvalidActualMonths(usize),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
