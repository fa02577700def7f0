use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_damerau_levenshtein};

use super::weights::{FieldWeights, IDENTITY_WEIGHTS};
use crate::fingerprint::{normalize_email, normalize_name, normalize_phone};
use crate::CandidateIdentity;

/// How a scored pair is classified. `Exact` is reserved for a full 1.0
/// aggregate (the digest-collision path); everything at or above the fuzzy
/// threshold but below 1.0 is `Fuzzy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// Identity fields that can contribute to a match explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchField {
    Name,
    Email,
    Phone,
}

impl MatchField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchField::Name => "name",
            MatchField::Email => "email",
            MatchField::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimilarityConfig {
    pub weights: FieldWeights,
    /// Aggregate score at which a pair is reported as a fuzzy match.
    pub fuzzy_threshold: f64,
    /// Name similarity at which the name field itself counts as matching
    /// for explanation purposes.
    pub name_field_threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            weights: IDENTITY_WEIGHTS,
            fuzzy_threshold: 0.75,
            name_field_threshold: 0.8,
        }
    }
}

/// Outcome of comparing two identities. `match_type` is `None` below the
/// fuzzy threshold; `matching_fields` lists every field whose own comparison
/// cleared its field-specific threshold, whether or not it carried weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityOutcome {
    pub score: f64,
    pub match_type: Option<MatchType>,
    pub matching_fields: Vec<MatchField>,
}

/// Order-independent similarity of two already-normalized names.
///
/// Best-of across Jaro-Winkler and normalized Damerau-Levenshtein, each on
/// the raw and the token-sorted strings, so "Smith John" scores 1.0 against
/// "John Smith" and near-miss spellings still score high. Symmetric in its
/// arguments.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let sorted_a = token_sorted(a);
    let sorted_b = token_sorted(b);

    [
        jaro_winkler(a, b),
        normalized_damerau_levenshtein(a, b),
        jaro_winkler(&sorted_a, &sorted_b),
        normalized_damerau_levenshtein(&sorted_a, &sorted_b),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn token_sorted(name: &str) -> String {
    let mut tokens: Vec<&str> = name.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Weighted multi-field similarity between two identities.
///
/// Email and phone participate only when both sides carry the field; the
/// aggregate is divided by the sum of participating weights, so two records
/// missing the same optional fields can still reach 1.0 from name alone.
pub fn score_identities(
    a: &CandidateIdentity,
    b: &CandidateIdentity,
    config: &SimilarityConfig,
) -> SimilarityOutcome {
    let weights = config.weights;

    let name_a = normalize_name(&a.name);
    let name_b = normalize_name(&b.name);
    let name_score = name_similarity(&name_a, &name_b);

    let mut score = name_score * weights.name;
    let mut total_weight = weights.name;
    let mut matching_fields = Vec::new();

    if name_score >= config.name_field_threshold {
        matching_fields.push(MatchField::Name);
    }

    let email_a = nonempty(a.email.as_deref().map(normalize_email));
    let email_b = nonempty(b.email.as_deref().map(normalize_email));
    if let (Some(email_a), Some(email_b)) = (&email_a, &email_b) {
        let equal = email_a == email_b;
        score += if equal { weights.email } else { 0.0 };
        total_weight += weights.email;
        if equal {
            matching_fields.push(MatchField::Email);
        }
    }

    let phone_a = nonempty(a.phone.as_deref().map(normalize_phone));
    let phone_b = nonempty(b.phone.as_deref().map(normalize_phone));
    if let (Some(phone_a), Some(phone_b)) = (&phone_a, &phone_b) {
        let equal = phone_a == phone_b;
        score += if equal { weights.phone } else { 0.0 };
        total_weight += weights.phone;
        if equal {
            matching_fields.push(MatchField::Phone);
        }
    }

    let aggregate = if total_weight > 0.0 {
        score / total_weight
    } else {
        0.0
    };

    let match_type = if aggregate >= 1.0 {
        Some(MatchType::Exact)
    } else if aggregate >= config.fuzzy_threshold {
        Some(MatchType::Fuzzy)
    } else {
        None
    };

    SimilarityOutcome {
        score: aggregate,
        match_type,
        matching_fields,
    }
}

fn nonempty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, email: Option<&str>, phone: Option<&str>) -> CandidateIdentity {
        CandidateIdentity {
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[test]
    fn identical_identities_score_exactly_one() {
        let a = identity("John Smith", Some("j.smith@co.com"), Some("5550100001"));
        let outcome = score_identities(&a, &a.clone(), &SimilarityConfig::default());

        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.match_type, Some(MatchType::Exact));
        assert_eq!(
            outcome.matching_fields,
            vec![MatchField::Name, MatchField::Email, MatchField::Phone]
        );
    }

    #[test]
    fn scoring_is_symmetric() {
        let config = SimilarityConfig::default();
        let pairs = [
            (
                identity("Jon Smith", None, None),
                identity("John Smith", None, None),
            ),
            (
                identity("Jane Doe", Some("jane@co.com"), Some("5550100001")),
                identity("Jane M Doe", Some("jane@co.com"), None),
            ),
            (
                identity("Alice Lee", Some("alice@co.com"), None),
                identity("Bob Chan", Some("bob@co.com"), Some("5550100009")),
            ),
        ];

        for (a, b) in pairs {
            let ab = score_identities(&a, &b, &config);
            let ba = score_identities(&b, &a, &config);
            assert_eq!(ab.score, ba.score);
            assert_eq!(ab.match_type, ba.match_type);
        }
    }

    #[test]
    fn name_only_records_redistribute_weight() {
        let a = identity("Jon Smith", None, None);
        let b = identity("John Smith", None, None);
        let outcome = score_identities(&a, &b, &SimilarityConfig::default());

        assert!(outcome.score >= 0.75, "score was {}", outcome.score);
        assert!(outcome.score < 1.0);
        assert_eq!(outcome.match_type, Some(MatchType::Fuzzy));
        assert_eq!(outcome.matching_fields, vec![MatchField::Name]);
    }

    #[test]
    fn token_order_does_not_penalize_names() {
        assert_eq!(name_similarity("smith john", "john smith"), 1.0);
    }

    #[test]
    fn email_counts_only_when_both_sides_have_one() {
        let config = SimilarityConfig::default();
        let with_email = identity("John Smith", Some("j@co.com"), None);
        let without_email = identity("John Smith", None, None);

        let outcome = score_identities(&with_email, &without_email, &config);
        assert_eq!(outcome.score, 1.0);
        assert_eq!(outcome.matching_fields, vec![MatchField::Name]);
    }

    #[test]
    fn mismatched_email_drags_the_aggregate_down() {
        let config = SimilarityConfig::default();
        let a = identity("John Smith", Some("john@co.com"), None);
        let b = identity("John Smith", Some("other@co.com"), None);

        let outcome = score_identities(&a, &b, &config);
        // name 1.0 * 0.5 over 0.8 participating weight
        assert!(outcome.score < 0.75, "score was {}", outcome.score);
        assert_eq!(outcome.match_type, None);
        assert_eq!(outcome.matching_fields, vec![MatchField::Name]);
    }

    #[test]
    fn matching_fields_report_fields_beyond_their_weight() {
        let config = SimilarityConfig::default();
        let a = identity("Jonathan Q Smithers", Some("js@co.com"), Some("+1-555-010-0001"));
        let b = identity("Bob Chan", Some("js@co.com"), Some("5550100001"));

        let outcome = score_identities(&a, &b, &config);
        assert_eq!(
            outcome.matching_fields,
            vec![MatchField::Email, MatchField::Phone]
        );
    }

    #[test]
    fn unrelated_identities_fall_below_threshold() {
        let a = identity("Alice Lee", None, None);
        let b = identity("Bob Chan", None, None);

        let outcome = score_identities(&a, &b, &SimilarityConfig::default());
        assert!(outcome.score < 0.75, "score was {}", outcome.score);
        assert_eq!(outcome.match_type, None);
    }

    #[test]
    fn empty_name_scores_zero() {
        assert_eq!(name_similarity("", "john smith"), 0.0);
        assert_eq!(name_similarity("john smith", ""), 0.0);
    }
}
