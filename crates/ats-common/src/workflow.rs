use chrono::Utc;

use crate::matching::detection::DuplicateDetectionResult;
use crate::{Application, Candidate, CandidateStatus};

/// Why workflow progression is blocked for an application.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionBlock {
    #[error("application flagged for review: {0}")]
    FlaggedForReview(String),
    #[error("candidate has LEFT status")]
    CandidateLeft,
}

/// Persist a detection decision onto a new application row.
///
/// This is the only write path for the flag columns. Callers that could not
/// obtain a result (store unavailable) must leave the application unflagged
/// rather than guessing: fail open on the flag, fail loud on the error.
pub fn apply_flag_decision(application: &mut Application, result: &DuplicateDetectionResult) {
    application.flagged_for_review = result.should_flag;
    application.flag_reason = if result.should_flag {
        result.flag_reason.clone()
    } else {
        None
    };
    application.updated_at = Utc::now();
}

/// Gate checked before advancing an application through the hiring pipeline.
pub fn progression_allowed(
    application: &Application,
    candidate: &Candidate,
) -> Result<(), ProgressionBlock> {
    if application.flagged_for_review {
        let reason = application
            .flag_reason
            .clone()
            .unwrap_or_else(|| "unspecified".to_string());
        return Err(ProgressionBlock::FlaggedForReview(reason));
    }

    if candidate.status == CandidateStatus::Left {
        return Err(ProgressionBlock::CandidateLeft);
    }

    Ok(())
}
