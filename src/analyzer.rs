use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::error::{LexisError, Result};
use crate::model::{Metrics, Record};

/// Analyze `raw_text` into a fresh record stamped with the current time.
/// The empty string is valid input.
pub fn analyze(raw_text: &str) -> Record {
    Record::new(raw_text.to_string(), compute_metrics(raw_text), Utc::now())
}

/// Boundary variant for callers whose input may be absent.
pub fn try_analyze(raw_text: Option<&str>) -> Result<Record> {
    raw_text
        .map(analyze)
        .ok_or_else(|| LexisError::InvalidInput("Missing 'value' field.".to_string()))
}

pub fn compute_metrics(raw_text: &str) -> Metrics {
    Metrics {
        length: raw_text.chars().count(),
        is_palindrome: is_palindrome(raw_text),
        unique_character_count: raw_text.chars().collect::<HashSet<_>>().len(),
        word_count: raw_text.split_whitespace().count(),
        content_hash: content_hash(raw_text),
        character_frequency: character_frequency(raw_text),
    }
}

/// Lowercase hex SHA-256 over the unmodified UTF-8 bytes. Doubles as the record id.
pub fn content_hash(raw_text: &str) -> String {
    let digest = Sha256::digest(raw_text.as_bytes());
    format!("{:x}", digest)
}

/// Only case is folded. Whitespace and punctuation stay significant,
/// so "A man a plan" is not a palindrome.
pub fn is_palindrome(raw_text: &str) -> bool {
    let folded: Vec<char> = fold_case(raw_text).collect();
    folded.iter().eq(folded.iter().rev())
}

/// Per-character lowercase, so a final 'Σ' folds to 'σ' like any other.
pub fn fold_case(raw_text: &str) -> impl Iterator<Item = char> + '_ {
    raw_text.chars().flat_map(char::to_lowercase)
}

fn character_frequency(raw_text: &str) -> BTreeMap<String, usize> {
    let mut freq = BTreeMap::new();
    for c in raw_text.chars() {
        *freq.entry(c.to_string()).or_insert(0) += 1;
    }
    freq
}
