use serde::{Deserialize, Serialize};

use crate::analyzer;
use crate::error::{LexisError, Result};
use crate::model::Record;

/// Filter parameters as a caller supplies them, before validation.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct FilterQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_palindrome: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains_character: Option<String>,
}

/// A validated predicate set. Unset predicates impose no constraint;
/// set ones are combined with AND.
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Filter {
    pub is_palindrome: Option<bool>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub word_count: Option<usize>,
    pub contains_character: Option<char>,
}

impl FilterQuery {
    pub fn validate(&self) -> Result<Filter> {
        let contains_character = match self.contains_character.as_deref() {
            None | Some("") => None,
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(LexisError::Validation(
                            "contains_character must be a single character.".to_string(),
                        ))
                    }
                }
            }
        };

        Ok(Filter {
            is_palindrome: self.is_palindrome,
            min_length: non_negative("min_length", self.min_length)?,
            max_length: non_negative("max_length", self.max_length)?,
            word_count: non_negative("word_count", self.word_count)?,
            contains_character,
        })
    }
}

fn non_negative(name: &str, value: Option<i64>) -> Result<Option<usize>> {
    match value {
        None => Ok(None),
        Some(v) => usize::try_from(v)
            .map(Some)
            .map_err(|_| LexisError::Validation(format!("{} must be >= 0.", name))),
    }
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        *self == Filter::default()
    }

    pub fn matches(&self, record: &Record) -> bool {
        let m = &record.metrics;

        if let Some(p) = self.is_palindrome {
            if m.is_palindrome != p {
                return false;
            }
        }
        if let Some(min) = self.min_length {
            if m.length < min {
                return false;
            }
        }
        if let Some(max) = self.max_length {
            if m.length > max {
                return false;
            }
        }
        if let Some(words) = self.word_count {
            if m.word_count != words {
                return false;
            }
        }
        if let Some(c) = self.contains_character {
            if !contains_ignore_case(&record.raw_text, c) {
                return false;
            }
        }
        true
    }

    /// Keep the records matching every predicate, preserving input order.
    pub fn apply<R, I>(&self, records: I) -> Vec<R>
    where
        R: AsRef<Record>,
        I: IntoIterator<Item = R>,
    {
        records.into_iter().filter(|r| self.matches(r.as_ref())).collect()
    }
}

fn contains_ignore_case(haystack: &str, needle: char) -> bool {
    let needle: String = needle.to_lowercase().collect();
    analyzer::fold_case(haystack).collect::<String>().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze;

    #[test]
    fn predicates_combine_with_and() {
        // lengths {3,5,5,8}, word counts {1,1,2,1}
        let records = vec![
            analyze("abc"),
            analyze("abcde"),
            analyze("ab cd"),
            analyze("abcdefgh"),
        ];
        let filter = Filter {
            min_length: Some(5),
            word_count: Some(1),
            ..Default::default()
        };

        let hits: Vec<&str> = filter
            .apply(&records)
            .into_iter()
            .map(|r| r.raw_text.as_str())
            .collect();
        assert_eq!(hits, vec!["abcde", "abcdefgh"]);
    }

    #[test]
    fn empty_filter_keeps_everything() {
        let records = vec![analyze("x"), analyze("yy")];
        let filter = Filter::default();
        assert!(filter.is_empty());
        assert_eq!(filter.apply(&records).len(), 2);
    }

    #[test]
    fn contains_character_ignores_case() {
        let filter = Filter {
            contains_character: Some('z'),
            ..Default::default()
        };
        assert!(filter.matches(&analyze("JAZZ")));
        assert!(!filter.matches(&analyze("jam")));
    }

    #[test]
    fn contains_character_folds_final_sigma() {
        let filter = Filter {
            contains_character: Some('σ'),
            ..Default::default()
        };
        assert!(filter.matches(&analyze("ΟΔΟΣ")));

        let upper = Filter {
            contains_character: Some('Σ'),
            ..Default::default()
        };
        assert!(upper.matches(&analyze("οδος σ")));
    }

    #[test]
    fn length_bounds_are_inclusive() {
        let filter = Filter {
            min_length: Some(3),
            max_length: Some(3),
            ..Default::default()
        };
        assert!(filter.matches(&analyze("abc")));
        assert!(!filter.matches(&analyze("ab")));
        assert!(!filter.matches(&analyze("abcd")));
    }

    #[test]
    fn validate_rejects_negative_bounds() {
        for query in [
            FilterQuery { min_length: Some(-1), ..Default::default() },
            FilterQuery { max_length: Some(-5), ..Default::default() },
            FilterQuery { word_count: Some(-2), ..Default::default() },
        ] {
            let err = query.validate().unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        }
    }

    #[test]
    fn validate_rejects_multi_character_needle() {
        let query = FilterQuery {
            contains_character: Some("ab".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.validate().unwrap_err(),
            LexisError::Validation("contains_character must be a single character.".to_string())
        );
    }

    #[test]
    fn validate_treats_empty_needle_as_absent() {
        let query = FilterQuery {
            contains_character: Some(String::new()),
            min_length: Some(0),
            ..Default::default()
        };
        let filter = query.validate().unwrap();
        assert_eq!(filter.contains_character, None);
        assert_eq!(filter.min_length, Some(0));
    }

    #[test]
    fn validate_accepts_single_multibyte_character() {
        let query = FilterQuery {
            contains_character: Some("é".to_string()),
            ..Default::default()
        };
        assert_eq!(query.validate().unwrap().contains_character, Some('é'));
    }
}
