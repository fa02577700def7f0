use tokio_postgres::types::FromSql;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::PgPool;
use crate::store::{CandidateStore, FingerprintCoverage, StoreError};
use crate::{Candidate, CandidateStatus};

const CANDIDATE_COLUMNS: &str =
    "id, tenant_id, name, email, phone, fingerprint, status, created_at, updated_at";

/// Postgres-backed [`CandidateStore`] over `ats.candidates` and
/// `ats.applications`. Every query carries the tenant id in its WHERE clause;
/// isolation is enforced here, not re-checked by callers.
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> Result<T, StoreError> {
    row.try_get(name)
        .map_err(|e| StoreError::Mapping(format!("{name}: {e}")))
}

fn map_candidate_row(row: &Row) -> Result<Candidate, StoreError> {
    let status_raw: String = column(row, "status")?;
    let status = CandidateStatus::from_db(&status_raw)
        .ok_or_else(|| StoreError::Mapping(format!("unknown candidate status: {status_raw}")))?;

    Ok(Candidate {
        id: column(row, "id")?,
        tenant_id: column(row, "tenant_id")?,
        name: column(row, "name")?,
        email: column(row, "email")?,
        phone: column(row, "phone")?,
        fingerprint: column(row, "fingerprint")?,
        status,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

impl CandidateStore for PgCandidateStore {
    #[instrument(skip(self, fingerprint))]
    async fn find_by_fingerprint(
        &self,
        tenant_id: i64,
        fingerprint: &str,
    ) -> Result<Vec<Candidate>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!(
                "SELECT {CANDIDATE_COLUMNS}
                 FROM ats.candidates
                 WHERE tenant_id = $1 AND fingerprint = $2
                 ORDER BY created_at ASC, id ASC"
            ))
            .await?;

        let rows = client.query(&stmt, &[&tenant_id, &fingerprint]).await?;
        rows.iter().map(map_candidate_row).collect()
    }

    #[instrument(skip(self))]
    async fn scan_candidates(
        &self,
        tenant_id: i64,
        exclude_id: Option<i64>,
        after_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Candidate>, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(&format!(
                "SELECT {CANDIDATE_COLUMNS}
                 FROM ats.candidates
                 WHERE tenant_id = $1
                   AND id > $2
                   AND ($3::BIGINT IS NULL OR id <> $3)
                 ORDER BY id ASC
                 LIMIT $4"
            ))
            .await?;

        let floor = after_id.unwrap_or(i64::MIN);
        let rows = client
            .query(&stmt, &[&tenant_id, &floor, &exclude_id, &limit])
            .await?;
        rows.iter().map(map_candidate_row).collect()
    }

    #[instrument(skip(self, fingerprint))]
    async fn update_fingerprint(
        &self,
        candidate_id: i64,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(
                "UPDATE ats.candidates
                 SET fingerprint = $2, updated_at = NOW()
                 WHERE id = $1",
            )
            .await?;

        client.execute(&stmt, &[&candidate_id, &fingerprint]).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fingerprint_coverage(
        &self,
        tenant_id: i64,
    ) -> Result<FingerprintCoverage, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(
                "SELECT COUNT(*) AS total, COUNT(fingerprint) AS with_fingerprint
                 FROM ats.candidates
                 WHERE tenant_id = $1",
            )
            .await?;

        let row = client.query_one(&stmt, &[&tenant_id]).await?;
        let total: i64 = column(&row, "total")?;
        let with_fingerprint: i64 = column(&row, "with_fingerprint")?;
        Ok(FingerprintCoverage {
            total: total as u64,
            with_fingerprint: with_fingerprint as u64,
        })
    }

    #[instrument(skip(self))]
    async fn count_by_status(
        &self,
        tenant_id: i64,
        status: CandidateStatus,
    ) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(
                "SELECT COUNT(*) AS total
                 FROM ats.candidates
                 WHERE tenant_id = $1 AND status = $2",
            )
            .await?;

        let row = client.query_one(&stmt, &[&tenant_id, &status.as_str()]).await?;
        let total: i64 = column(&row, "total")?;
        Ok(total as u64)
    }

    #[instrument(skip(self))]
    async fn count_flagged_applications(&self, tenant_id: i64) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        let stmt = client
            .prepare(
                "SELECT COUNT(*) AS total
                 FROM ats.applications
                 WHERE tenant_id = $1 AND flagged_for_review",
            )
            .await?;

        let row = client.query_one(&stmt, &[&tenant_id]).await?;
        let total: i64 = column(&row, "total")?;
        Ok(total as u64)
    }
}
