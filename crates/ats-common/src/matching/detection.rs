use std::cmp::Ordering;

use serde::Serialize;
use tracing::{info, instrument};

use super::similarity::{score_identities, MatchField, MatchType, SimilarityConfig};
use crate::backfill::{self, BackfillConfig, BackfillStats};
use crate::fingerprint::fingerprint_identity;
use crate::store::{CandidateStore, StoreError};
use crate::{Candidate, CandidateIdentity, CandidateStatus};

/// Flag reason recorded for an exact fingerprint hit.
pub const EXACT_MATCH_REASON: &str = "Exact match found by identity fingerprint.";

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("invalid candidate data: {0}")]
    InvalidCandidateData(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct DetectionConfig {
    pub similarity: SimilarityConfig,
    /// Early-termination cap for the fuzzy scan. The scan stops as soon as
    /// this many matches have accumulated; `None` scans the whole tenant.
    pub max_matches: Option<usize>,
    /// Page size for the keyset scan over the tenant population.
    pub scan_page_size: i64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            max_matches: None,
            scan_page_size: 200,
        }
    }
}

/// One stored candidate compared against the identity under evaluation.
/// Transient; never persisted.
#[derive(Debug, Clone)]
pub struct DuplicateMatch {
    pub candidate: Candidate,
    pub score: f64,
    pub match_type: MatchType,
    pub matching_fields: Vec<MatchField>,
}

/// Aggregate outcome of one detection call. The caller (application-creation
/// workflow) persists `should_flag`/`flag_reason` onto the application row;
/// this service never writes them.
#[derive(Debug, Clone)]
pub struct DuplicateDetectionResult {
    pub has_duplicates: bool,
    pub should_flag: bool,
    pub flag_reason: Option<String>,
    pub fingerprint: String,
    /// Descending by score; equal scores rank the earlier-created row first.
    pub matches: Vec<DuplicateMatch>,
}

/// Read-only tenant-level report for operational tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DuplicateStatistics {
    pub total_candidates: u64,
    pub candidates_with_fingerprint: u64,
    pub candidates_without_fingerprint: u64,
    pub fingerprint_coverage_percentage: f64,
    pub flagged_applications: u64,
    pub left_status_candidates: u64,
}

/// Stateless decision engine over store reads. Safe to share or rebuild per
/// call; all durable state lives behind the [`CandidateStore`].
pub struct DuplicateDetectionService<S> {
    store: S,
    config: DetectionConfig,
}

impl<S: CandidateStore> DuplicateDetectionService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, DetectionConfig::default())
    }

    pub fn with_config(store: S, config: DetectionConfig) -> Self {
        Self { store, config }
    }

    /// Evaluate an incoming identity against the tenant's stored candidates.
    pub async fn detect_duplicates(
        &self,
        tenant_id: i64,
        identity: &CandidateIdentity,
    ) -> Result<DuplicateDetectionResult, DetectionError> {
        self.detect_duplicates_excluding(tenant_id, identity, None).await
    }

    /// Like [`Self::detect_duplicates`], but skips one stored row — used when
    /// re-evaluating a candidate that is already persisted.
    #[instrument(skip(self, identity))]
    pub async fn detect_duplicates_excluding(
        &self,
        tenant_id: i64,
        identity: &CandidateIdentity,
        exclude_id: Option<i64>,
    ) -> Result<DuplicateDetectionResult, DetectionError> {
        if identity.name.trim().is_empty() {
            return Err(DetectionError::InvalidCandidateData(
                "candidate name must not be empty".into(),
            ));
        }

        let fingerprint = fingerprint_identity(identity);

        let exact_hits = self.store.find_by_fingerprint(tenant_id, &fingerprint).await?;
        if let Some(hit) = exact_hits.into_iter().find(|c| Some(c.id) != exclude_id) {
            info!(tenant_id, candidate_id = hit.id, "exact fingerprint match");
            let matches = vec![DuplicateMatch {
                candidate: hit,
                score: 1.0,
                match_type: MatchType::Exact,
                matching_fields: present_fields(identity),
            }];
            return Ok(DuplicateDetectionResult {
                has_duplicates: true,
                should_flag: true,
                flag_reason: Some(EXACT_MATCH_REASON.to_string()),
                fingerprint,
                matches,
            });
        }

        let matches = self.fuzzy_scan(tenant_id, identity, exclude_id).await?;
        let should_flag = !matches.is_empty();
        let flag_reason = matches.first().map(flag_reason_for);

        if should_flag {
            info!(
                tenant_id,
                matches = matches.len(),
                top_score = matches[0].score,
                "fuzzy duplicate matches found"
            );
        }

        Ok(DuplicateDetectionResult {
            has_duplicates: should_flag,
            should_flag,
            flag_reason,
            fingerprint,
            matches,
        })
    }

    async fn fuzzy_scan(
        &self,
        tenant_id: i64,
        identity: &CandidateIdentity,
        exclude_id: Option<i64>,
    ) -> Result<Vec<DuplicateMatch>, StoreError> {
        let mut matches: Vec<DuplicateMatch> = Vec::new();
        let mut after_id = None;

        'scan: loop {
            let page = self
                .store
                .scan_candidates(tenant_id, exclude_id, after_id, self.config.scan_page_size)
                .await?;
            let Some(last) = page.last() else { break };
            after_id = Some(last.id);
            let page_len = page.len();

            for candidate in page {
                let outcome =
                    score_identities(identity, &candidate.identity(), &self.config.similarity);
                let Some(match_type) = outcome.match_type else {
                    continue;
                };

                matches.push(DuplicateMatch {
                    candidate,
                    score: outcome.score,
                    match_type,
                    matching_fields: outcome.matching_fields,
                });

                // Cancelled mid-scan: return what has accumulated.
                if self.config.max_matches.is_some_and(|cap| matches.len() >= cap) {
                    break 'scan;
                }
            }

            if (page_len as i64) < self.config.scan_page_size {
                break;
            }
        }

        matches.sort_by(|a, b| {
            match b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal) {
                Ordering::Equal => a.candidate.created_at.cmp(&b.candidate.created_at),
                other => other,
            }
        });

        Ok(matches)
    }

    /// Recompute fingerprints across one tenant. See [`backfill::run_backfill`].
    pub async fn batch_update_candidate_hashes(
        &self,
        tenant_id: i64,
        force: bool,
    ) -> Result<BackfillStats, StoreError> {
        let config = BackfillConfig {
            force,
            ..BackfillConfig::default()
        };
        backfill::run_backfill(&self.store, tenant_id, &config).await
    }

    /// Read-only aggregate report; no side effects.
    #[instrument(skip(self))]
    pub async fn get_duplicate_statistics(
        &self,
        tenant_id: i64,
    ) -> Result<DuplicateStatistics, StoreError> {
        let coverage = self.store.fingerprint_coverage(tenant_id).await?;
        let flagged_applications = self.store.count_flagged_applications(tenant_id).await?;
        let left_status_candidates = self
            .store
            .count_by_status(tenant_id, CandidateStatus::Left)
            .await?;

        let fingerprint_coverage_percentage = if coverage.total > 0 {
            coverage.with_fingerprint as f64 / coverage.total as f64 * 100.0
        } else {
            0.0
        };

        Ok(DuplicateStatistics {
            total_candidates: coverage.total,
            candidates_with_fingerprint: coverage.with_fingerprint,
            candidates_without_fingerprint: coverage.total - coverage.with_fingerprint,
            fingerprint_coverage_percentage,
            flagged_applications,
            left_status_candidates,
        })
    }
}

/// The evaluated identity's non-empty fields, in explanation order.
fn present_fields(identity: &CandidateIdentity) -> Vec<MatchField> {
    let mut fields = vec![MatchField::Name];
    if identity.email.as_deref().is_some_and(|e| !e.trim().is_empty()) {
        fields.push(MatchField::Email);
    }
    if identity.phone.as_deref().is_some_and(|p| !p.trim().is_empty()) {
        fields.push(MatchField::Phone);
    }
    fields
}

fn flag_reason_for(top: &DuplicateMatch) -> String {
    match top.match_type {
        MatchType::Exact => EXACT_MATCH_REASON.to_string(),
        MatchType::Fuzzy => {
            let fields = if top.matching_fields.is_empty() {
                "profile".to_string()
            } else {
                top.matching_fields
                    .iter()
                    .map(|f| f.as_str())
                    .collect::<Vec<_>>()
                    .join("+")
            };
            format!("Potential duplicate: {fields} match, {:.2} similarity", top.score)
        }
    }
}
