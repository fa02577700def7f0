use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;

#[derive(Debug, thiserror::Error)]
pub enum ApplicationStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("application not found: {0}")]
    NotFound(i64),
}

/// Mark one application for manual review.
///
/// This is the caller-side persistence of a duplicate-detection decision;
/// the detection service itself never writes application rows.
#[instrument(skip(pool, reason))]
pub async fn flag_for_review(
    pool: &PgPool,
    application_id: i64,
    reason: &str,
) -> Result<(), ApplicationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "UPDATE ats.applications
             SET flagged_for_review = true, flag_reason = $2, updated_at = NOW()
             WHERE id = $1",
        )
        .await?;

    let rows = client.execute(&stmt, &[&application_id, &reason]).await?;
    if rows == 0 {
        return Err(ApplicationStorageError::NotFound(application_id));
    }
    Ok(())
}

/// Clear a review flag after an operator resolves it.
#[instrument(skip(pool))]
pub async fn clear_flag(
    pool: &PgPool,
    application_id: i64,
) -> Result<(), ApplicationStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "UPDATE ats.applications
             SET flagged_for_review = false, flag_reason = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .await?;

    let rows = client.execute(&stmt, &[&application_id]).await?;
    if rows == 0 {
        return Err(ApplicationStorageError::NotFound(application_id));
    }
    Ok(())
}
