pub mod backfill;
pub mod db;
pub mod fingerprint;
pub mod logging;
pub mod matching;
pub mod schema;
pub mod store;
pub mod workflow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate lifecycle status. Persisted as upper-case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Active,
    Hired,
    Left,
    Blacklisted,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Active => "ACTIVE",
            CandidateStatus::Hired => "HIRED",
            CandidateStatus::Left => "LEFT",
            CandidateStatus::Blacklisted => "BLACKLISTED",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "ACTIVE" => Some(CandidateStatus::Active),
            "HIRED" => Some(CandidateStatus::Hired),
            "LEFT" => Some(CandidateStatus::Left),
            "BLACKLISTED" => Some(CandidateStatus::Blacklisted),
            _ => None,
        }
    }
}

// Commonly used data models for identity resolution.

/// One stored job-seeker row, scoped to a tenant.
///
/// `fingerprint` is derived from the normalized (name, email, phone) triple
/// and must be recomputed whenever any of those fields changes. Two rows in
/// the same tenant may share a fingerprint; that is a candidate duplicate,
/// not a storage constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub tenant_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub fingerprint: Option<String>,
    pub status: CandidateStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(id: i64, tenant_id: i64, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            tenant_id,
            name: name.into(),
            email: None,
            phone: None,
            fingerprint: None,
            status: CandidateStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// The identity triple used for fingerprinting and similarity scoring.
    pub fn identity(&self) -> CandidateIdentity {
        CandidateIdentity {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Unsaved identity fields under evaluation (direct entry or resume ingestion).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateIdentity {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// A candidate's attachment to a hiring process. The flag columns are written
/// only from a duplicate-detection decision by the creating workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: i64,
    pub tenant_id: i64,
    pub candidate_id: i64,
    pub flagged_for_review: bool,
    pub flag_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn new(id: i64, tenant_id: i64, candidate_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id,
            tenant_id,
            candidate_id,
            flagged_for_review: false,
            flag_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}
