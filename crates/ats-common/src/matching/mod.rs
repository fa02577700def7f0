pub mod detection;
pub mod similarity;
pub mod weights;

pub use detection::{
    DetectionConfig, DetectionError, DuplicateDetectionResult, DuplicateDetectionService,
    DuplicateMatch, DuplicateStatistics, EXACT_MATCH_REASON,
};
pub use similarity::{score_identities, MatchField, MatchType, SimilarityConfig, SimilarityOutcome};
pub use weights::{FieldWeights, IDENTITY_WEIGHTS};
