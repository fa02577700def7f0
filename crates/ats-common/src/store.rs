#![allow(async_fn_in_trait)]

use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::{Application, Candidate, CandidateStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("failed to map candidate row: {0}")]
    Mapping(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FingerprintCoverage {
    pub total: u64,
    pub with_fingerprint: u64,
}

/// Tenant-scoped persistence contract consumed by the matching core.
///
/// Tenant isolation is enforced at this boundary: every read takes a tenant
/// id and must never return another tenant's rows, fingerprint collisions
/// included. Failures surface as [`StoreError::Unavailable`]; the core does
/// not retry — retry policy belongs to the caller.
pub trait CandidateStore {
    /// Rows sharing the given fingerprint, ordered by `created_at` then `id`.
    async fn find_by_fingerprint(
        &self,
        tenant_id: i64,
        fingerprint: &str,
    ) -> Result<Vec<Candidate>, StoreError>;

    /// Keyset-paged scan ascending by `id`. `after_id` resumes past the last
    /// row of the previous page; `exclude_id` skips one row.
    async fn scan_candidates(
        &self,
        tenant_id: i64,
        exclude_id: Option<i64>,
        after_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Candidate>, StoreError>;

    /// Idempotent single-row fingerprint write.
    async fn update_fingerprint(
        &self,
        candidate_id: i64,
        fingerprint: &str,
    ) -> Result<(), StoreError>;

    async fn fingerprint_coverage(&self, tenant_id: i64)
        -> Result<FingerprintCoverage, StoreError>;

    async fn count_by_status(
        &self,
        tenant_id: i64,
        status: CandidateStatus,
    ) -> Result<u64, StoreError>;

    async fn count_flagged_applications(&self, tenant_id: i64) -> Result<u64, StoreError>;
}

/// In-memory store with the same ordering semantics as the Postgres
/// implementation. Backs unit tests and local tooling.
#[derive(Debug, Default)]
pub struct MemoryCandidateStore {
    candidates: Mutex<Vec<Candidate>>,
    applications: Mutex<Vec<Application>>,
}

impl MemoryCandidateStore {
    pub fn insert(&self, candidate: Candidate) {
        if let Ok(mut rows) = self.candidates.lock() {
            rows.push(candidate);
        }
    }

    pub fn insert_application(&self, application: Application) {
        if let Ok(mut rows) = self.applications.lock() {
            rows.push(application);
        }
    }

    pub fn get(&self, candidate_id: i64) -> Option<Candidate> {
        self.candidates
            .lock()
            .ok()?
            .iter()
            .find(|c| c.id == candidate_id)
            .cloned()
    }

    fn candidates(&self) -> Result<MutexGuard<'_, Vec<Candidate>>, StoreError> {
        self.candidates
            .lock()
            .map_err(|_| StoreError::Unavailable("candidate store lock poisoned".into()))
    }

    fn applications(&self) -> Result<MutexGuard<'_, Vec<Application>>, StoreError> {
        self.applications
            .lock()
            .map_err(|_| StoreError::Unavailable("application store lock poisoned".into()))
    }
}

impl CandidateStore for MemoryCandidateStore {
    async fn find_by_fingerprint(
        &self,
        tenant_id: i64,
        fingerprint: &str,
    ) -> Result<Vec<Candidate>, StoreError> {
        let mut rows: Vec<Candidate> = self
            .candidates()?
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.fingerprint.as_deref() == Some(fingerprint))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn scan_candidates(
        &self,
        tenant_id: i64,
        exclude_id: Option<i64>,
        after_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Candidate>, StoreError> {
        let floor = after_id.unwrap_or(i64::MIN);
        let mut rows: Vec<Candidate> = self
            .candidates()?
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.id > floor && Some(c.id) != exclude_id)
            .cloned()
            .collect();
        rows.sort_by_key(|c| c.id);
        rows.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(rows)
    }

    async fn update_fingerprint(
        &self,
        candidate_id: i64,
        fingerprint: &str,
    ) -> Result<(), StoreError> {
        let mut rows = self.candidates()?;
        if let Some(candidate) = rows.iter_mut().find(|c| c.id == candidate_id) {
            candidate.fingerprint = Some(fingerprint.to_string());
            candidate.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn fingerprint_coverage(
        &self,
        tenant_id: i64,
    ) -> Result<FingerprintCoverage, StoreError> {
        let rows = self.candidates()?;
        let total = rows.iter().filter(|c| c.tenant_id == tenant_id).count() as u64;
        let with_fingerprint = rows
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.fingerprint.is_some())
            .count() as u64;
        Ok(FingerprintCoverage {
            total,
            with_fingerprint,
        })
    }

    async fn count_by_status(
        &self,
        tenant_id: i64,
        status: CandidateStatus,
    ) -> Result<u64, StoreError> {
        Ok(self
            .candidates()?
            .iter()
            .filter(|c| c.tenant_id == tenant_id && c.status == status)
            .count() as u64)
    }

    async fn count_flagged_applications(&self, tenant_id: i64) -> Result<u64, StoreError> {
        Ok(self
            .applications()?
            .iter()
            .filter(|a| a.tenant_id == tenant_id && a.flagged_for_review)
            .count() as u64)
    }
}
