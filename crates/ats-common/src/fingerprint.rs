use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use crate::CandidateIdentity;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static RE_SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]+").unwrap());

/// Honorifics dropped from the head of a name ("Mr. John Smith" == "John Smith").
const NAME_PREFIXES: &[&str] = &["mr", "mrs", "ms", "dr", "prof"];

/// Generational markers dropped from the tail ("John Smith Jr." == "John Smith").
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv"];

/// Digits kept from the end of a phone number; drops country codes and
/// trunk prefixes so "+1 (555) 010-0001" and "5550100001" compare equal.
pub const PHONE_SUFFIX_LEN: usize = 10;

/// NFKC, lower-case, strip honorific prefix and generational suffix tokens,
/// drop everything that is not a letter, digit or space, collapse whitespace.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.nfkc().collect::<String>().to_lowercase();
    let collapsed = RE_WHITESPACE.replace_all(lowered.trim(), " ");

    let mut tokens: Vec<&str> = collapsed.split(' ').filter(|t| !t.is_empty()).collect();
    if let Some(first) = tokens.first() {
        if NAME_PREFIXES.contains(&first.trim_end_matches('.')) {
            tokens.remove(0);
        }
    }
    if let Some(last) = tokens.last() {
        if NAME_SUFFIXES.contains(&last.trim_end_matches('.')) {
            tokens.pop();
        }
    }

    let joined = tokens.join(" ");
    let cleaned = RE_SYMBOLS.replace_all(&joined, "");
    RE_WHITESPACE.replace_all(cleaned.trim(), " ").into_owned()
}

/// Lower-cases and trims, removes plus-addressing from the local part, and
/// drops local-part dots for gmail.com (gmail ignores them).
pub fn normalize_email(email: &str) -> String {
    let lowered = email.trim().to_lowercase();

    let Some((local, domain)) = lowered.split_once('@') else {
        return lowered;
    };

    let mut local = match local.split_once('+') {
        Some((base, _)) => base.to_string(),
        None => local.to_string(),
    };
    if domain == "gmail.com" {
        local.retain(|c| c != '.');
    }

    format!("{local}@{domain}")
}

/// Keeps digits only, then only the trailing [`PHONE_SUFFIX_LEN`] of them.
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    let skip = digits.len().saturating_sub(PHONE_SUFFIX_LEN);
    digits[skip..].to_string()
}

/// Deterministic identity digest over the normalized (name, email, phone)
/// triple. Missing optionals hash as empty strings so name-only records still
/// get a stable, comparable fingerprint; the `|` separators keep
/// ("john doe", "") distinct from ("john", "doe").
///
/// Pure and side-effect free; callable from the per-write path and backfill.
pub fn fingerprint(name: &str, email: Option<&str>, phone: Option<&str>) -> String {
    let normalized_name = normalize_name(name);
    let normalized_email = email.map(normalize_email).unwrap_or_default();
    let normalized_phone = phone.map(normalize_phone).unwrap_or_default();

    let input = format!("{normalized_name}|{normalized_email}|{normalized_phone}");

    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

pub fn fingerprint_identity(identity: &CandidateIdentity) -> String {
    fingerprint(
        &identity.name,
        identity.email.as_deref(),
        identity.phone.as_deref(),
    )
}
