use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Wire format for `created_at` (UTC, second precision)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Everything we derive from a piece of text
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Metrics {
    /// Characters, whitespace included
    pub length: usize,

    /// Case-folded sequence equals its reverse (spaces and punctuation count)
    pub is_palindrome: bool,

    /// Distinct characters, case-sensitive
    #[serde(rename = "unique_characters")]
    pub unique_character_count: usize,

    /// Maximal non-whitespace runs
    pub word_count: usize,

    /// Lowercase hex SHA-256 of the raw UTF-8 bytes
    #[serde(rename = "sha256_hash")]
    pub content_hash: String,

    /// One-character keys, sorted for a stable rendering
    #[serde(rename = "character_frequency_map")]
    pub character_frequency: BTreeMap<String, usize>,
}

/// The Atomic Unit of Lexis
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Record {
    /// Content hash; identical text always maps to the same id
    #[serde(rename = "id")]
    pub identifier: String,

    /// The text exactly as submitted
    #[serde(rename = "value")]
    pub raw_text: String,

    #[serde(rename = "properties")]
    pub metrics: Metrics,

    /// When the text was analyzed
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Record {
    pub fn new(raw_text: String, metrics: Metrics, created_at: DateTime<Utc>) -> Self {
        Self {
            identifier: metrics.content_hash.clone(),
            raw_text,
            metrics,
            created_at,
        }
    }
}

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn record_serializes_to_wire_shape() {
        let mut freq = BTreeMap::new();
        freq.insert("a".to_string(), 2);
        freq.insert("b".to_string(), 1);

        let metrics = Metrics {
            length: 3,
            is_palindrome: true,
            unique_character_count: 2,
            word_count: 1,
            content_hash: "abc123".to_string(),
            character_frequency: freq,
        };
        let ts = Utc.with_ymd_and_hms(2025, 10, 21, 8, 30, 5).unwrap();
        let record = Record::new("aba".to_string(), metrics, ts);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["value"], "aba");
        assert_eq!(json["created_at"], "2025-10-21T08:30:05Z");
        assert_eq!(json["properties"]["unique_characters"], 2);
        assert_eq!(json["properties"]["sha256_hash"], "abc123");
        assert_eq!(json["properties"]["character_frequency_map"]["a"], 2);
    }
}
