use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::fingerprint::fingerprint_identity;
use crate::store::{CandidateStore, StoreError};

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// Candidates fetched per keyset page.
    pub page_size: i64,
    /// Rewrite fingerprints even when the stored value already matches.
    pub force: bool,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            page_size: 500,
            force: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillStats {
    pub total: u64,
    pub updated: u64,
    pub skipped: u64,
    pub errors: u64,
}

/// One fingerprint pass over a tenant's candidate population.
///
/// Pages by keyset so memory stays bounded against a live, growing dataset.
/// A row is skipped when its stored fingerprint already equals the freshly
/// computed one and `force` is off, which makes a re-run after a partial
/// failure a no-op for rows that are already correct. Per-row write failures
/// are counted and logged without aborting the pass; a failed page fetch
/// aborts with the store error.
#[instrument(skip(store, config), fields(force = config.force))]
pub async fn run_backfill<S: CandidateStore>(
    store: &S,
    tenant_id: i64,
    config: &BackfillConfig,
) -> Result<BackfillStats, StoreError> {
    let mut stats = BackfillStats::default();
    let mut after_id = None;

    loop {
        let page = store
            .scan_candidates(tenant_id, None, after_id, config.page_size)
            .await?;
        let Some(last) = page.last() else { break };
        after_id = Some(last.id);
        let page_len = page.len();

        for candidate in page {
            stats.total += 1;
            let fresh = fingerprint_identity(&candidate.identity());

            if !config.force && candidate.fingerprint.as_deref() == Some(fresh.as_str()) {
                stats.skipped += 1;
                continue;
            }

            match store.update_fingerprint(candidate.id, &fresh).await {
                Ok(()) => stats.updated += 1,
                Err(err) => {
                    warn!(
                        candidate_id = candidate.id,
                        error = %err,
                        "fingerprint update failed; continuing"
                    );
                    stats.errors += 1;
                }
            }
        }

        if (page_len as i64) < config.page_size {
            break;
        }
    }

    info!(
        tenant_id,
        total = stats.total,
        updated = stats.updated,
        skipped = stats.skipped,
        errors = stats.errors,
        "fingerprint backfill finished"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::fingerprint;
    use crate::store::{FingerprintCoverage, MemoryCandidateStore};
    use crate::{Candidate, CandidateStatus};

    fn unhashed(id: i64, tenant_id: i64, name: &str) -> Candidate {
        Candidate::new(id, tenant_id, name)
    }

    #[tokio::test]
    async fn fills_missing_fingerprints_then_becomes_a_no_op() {
        let store = MemoryCandidateStore::default();
        for id in 1..=3 {
            store.insert(unhashed(id, 1, "John Smith"));
        }

        let config = BackfillConfig::default();
        let first = run_backfill(&store, 1, &config).await.unwrap();
        assert_eq!(first.total, 3);
        assert_eq!(first.updated, 3);
        assert_eq!(first.skipped, 0);
        assert_eq!(first.errors, 0);

        let second = run_backfill(&store, 1, &config).await.unwrap();
        assert_eq!(second.total, 3);
        assert_eq!(second.updated, 0);
        assert_eq!(second.skipped, 3);
    }

    #[tokio::test]
    async fn stale_fingerprints_are_recomputed() {
        let store = MemoryCandidateStore::default();
        let mut candidate = unhashed(1, 1, "John Smith");
        candidate.fingerprint = Some("stale".into());
        store.insert(candidate);

        let stats = run_backfill(&store, 1, &BackfillConfig::default()).await.unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(
            store.get(1).unwrap().fingerprint,
            Some(fingerprint("John Smith", None, None))
        );
    }

    #[tokio::test]
    async fn force_rewrites_consistent_rows() {
        let store = MemoryCandidateStore::default();
        let mut candidate = unhashed(1, 1, "John Smith");
        candidate.fingerprint = Some(fingerprint("John Smith", None, None));
        store.insert(candidate);

        let config = BackfillConfig {
            force: true,
            ..BackfillConfig::default()
        };
        let stats = run_backfill(&store, 1, &config).await.unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.skipped, 0);
    }

    #[tokio::test]
    async fn small_pages_still_cover_every_row() {
        let store = MemoryCandidateStore::default();
        for id in 1..=5 {
            store.insert(unhashed(id, 1, "John Smith"));
        }
        store.insert(unhashed(6, 2, "Other Tenant"));

        let config = BackfillConfig {
            page_size: 2,
            ..BackfillConfig::default()
        };
        let stats = run_backfill(&store, 1, &config).await.unwrap();
        assert_eq!(stats.total, 5);
        assert_eq!(stats.updated, 5);
        assert!(store.get(6).unwrap().fingerprint.is_none());
    }

    struct FlakyStore {
        inner: MemoryCandidateStore,
        fail_update_id: i64,
    }

    impl CandidateStore for FlakyStore {
        async fn find_by_fingerprint(
            &self,
            tenant_id: i64,
            fingerprint: &str,
        ) -> Result<Vec<Candidate>, StoreError> {
            self.inner.find_by_fingerprint(tenant_id, fingerprint).await
        }

        async fn scan_candidates(
            &self,
            tenant_id: i64,
            exclude_id: Option<i64>,
            after_id: Option<i64>,
            limit: i64,
        ) -> Result<Vec<Candidate>, StoreError> {
            self.inner
                .scan_candidates(tenant_id, exclude_id, after_id, limit)
                .await
        }

        async fn update_fingerprint(
            &self,
            candidate_id: i64,
            fingerprint: &str,
        ) -> Result<(), StoreError> {
            if candidate_id == self.fail_update_id {
                return Err(StoreError::Unavailable("injected failure".into()));
            }
            self.inner.update_fingerprint(candidate_id, fingerprint).await
        }

        async fn fingerprint_coverage(
            &self,
            tenant_id: i64,
        ) -> Result<FingerprintCoverage, StoreError> {
            self.inner.fingerprint_coverage(tenant_id).await
        }

        async fn count_by_status(
            &self,
            tenant_id: i64,
            status: CandidateStatus,
        ) -> Result<u64, StoreError> {
            self.inner.count_by_status(tenant_id, status).await
        }

        async fn count_flagged_applications(&self, tenant_id: i64) -> Result<u64, StoreError> {
            self.inner.count_flagged_applications(tenant_id).await
        }
    }

    #[tokio::test]
    async fn a_failing_row_is_counted_and_the_pass_continues() {
        let inner = MemoryCandidateStore::default();
        for id in 1..=3 {
            inner.insert(unhashed(id, 1, "John Smith"));
        }
        let store = FlakyStore {
            inner,
            fail_update_id: 2,
        };

        let stats = run_backfill(&store, 1, &BackfillConfig::default()).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.updated, 2);
        assert_eq!(stats.errors, 1);

        // The failed row is picked up by the next pass.
        let retry = run_backfill(&store, 1, &BackfillConfig::default()).await.unwrap();
        assert_eq!(retry.updated, 0);
        assert_eq!(retry.errors, 1);
        assert_eq!(retry.skipped, 2);
    }
}
