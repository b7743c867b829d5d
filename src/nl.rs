//! Best-effort translation of a handful of English query shapes into a [`Filter`].
//!
//! The query is lowercased and run through an ordered rule table. Every rule
//! sees the whole query; matches accumulate. Only the first containment rule
//! that yields a character wins. Anything unrecognised is ignored, so a
//! query nothing matches becomes the empty filter.

use nom::{
    bytes::complete::take_till1,
    character::complete::{digit1, multispace0},
    combinator::map_res,
    sequence::preceded,
    IResult,
};

use crate::analyzer;
use crate::error::{LexisError, Result};
use crate::filter::Filter;

type Rule = fn(&str, &mut Filter);

const RULES: &[(&str, Rule)] = &[
    ("palindrome", palindrome),
    ("single word", single_word),
    ("longer than", longer_than),
    ("containing the letter", containing_the_letter),
    ("first vowel", first_vowel),
    ("containing", containing_token),
];

pub fn translate(query: &str) -> Result<Filter> {
    if query.trim().is_empty() {
        return Err(LexisError::InvalidInput("Query cannot be empty".to_string()));
    }

    let query: String = analyzer::fold_case(query).collect();
    let mut filter = Filter::default();
    for (name, rule) in RULES {
        let before = filter;
        rule(&query, &mut filter);
        if filter != before {
            tracing::trace!(rule = name, "natural language rule matched");
        }
    }
    if filter.is_empty() {
        tracing::debug!(query = %query, "natural language query matched no rules");
    }
    Ok(filter)
}

// --- RULES ---

fn palindrome(q: &str, f: &mut Filter) {
    if q.contains("palindromic") || q.contains("palindrome") {
        f.is_palindrome = Some(true);
    }
}

fn single_word(q: &str, f: &mut Filter) {
    if q.contains("single word") || q.contains("one word") {
        f.word_count = Some(1);
    }
}

/// "longer than N" means strictly greater, so the bound is N + 1.
fn longer_than(q: &str, f: &mut Filter) {
    if let Some(tail) = after(q, "longer than") {
        if let Ok((_, n)) = parse_usize(tail) {
            f.min_length = Some(n.saturating_add(1));
        }
    }
}

fn containing_the_letter(q: &str, f: &mut Filter) {
    if f.contains_character.is_some() {
        return;
    }
    if let Some(tail) = after(q, "containing the letter") {
        if let Ok((_, token)) = parse_token(tail) {
            f.contains_character = strip_token(token).chars().next();
        }
    }
}

/// "...that contain the first vowel" reads as 'a'.
fn first_vowel(q: &str, f: &mut Filter) {
    if f.contains_character.is_some() {
        return;
    }
    if after(q, "contain").is_some_and(|tail| tail.contains("the first vowel")) {
        f.contains_character = Some('a');
    }
}

/// "containing z" or "containing the z": take the token if it is one character.
fn containing_token(q: &str, f: &mut Filter) {
    if f.contains_character.is_some() {
        return;
    }
    let words: Vec<&str> = q.split_whitespace().collect();
    let Some(idx) = words.iter().position(|w| *w == "containing") else {
        return;
    };

    let mut candidates = words[idx + 1..].iter().map(|w| strip_token(w));
    let picked = match candidates.next() {
        Some("the") => candidates.next(),
        other => other,
    };
    if let Some(c) = picked.and_then(single_char) {
        f.contains_character = Some(c);
    }
}

// --- HELPERS ---

fn after<'a>(q: &'a str, phrase: &str) -> Option<&'a str> {
    q.find(phrase).map(|i| &q[i + phrase.len()..])
}

fn parse_usize(input: &str) -> IResult<&str, usize> {
    preceded(multispace0, map_res(digit1, |s: &str| s.parse::<usize>()))(input)
}

fn parse_token(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, take_till1(char::is_whitespace))(input)
}

fn strip_token(token: &str) -> &str {
    token.trim_matches(|c| matches!(c, '.' | ',' | '\'' | '"'))
}

fn single_char(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_palindromes() {
        let f = translate("all single word palindromic strings").unwrap();
        assert_eq!(
            f,
            Filter {
                word_count: Some(1),
                is_palindrome: Some(true),
                ..Default::default()
            }
        );
    }

    #[test]
    fn longer_than_is_strict() {
        let f = translate("strings longer than 10 characters").unwrap();
        assert_eq!(f, Filter { min_length: Some(11), ..Default::default() });
    }

    #[test]
    fn containing_the_letter() {
        let f = translate("strings containing the letter z").unwrap();
        assert_eq!(f, Filter { contains_character: Some('z'), ..Default::default() });

        let quoted = translate("Strings containing the letter 'Q'.").unwrap();
        assert_eq!(quoted.contains_character, Some('q'));

        let sigma = translate("words containing the letter Σ").unwrap();
        assert_eq!(sigma.contains_character, Some('σ'));
    }

    #[test]
    fn bare_containing_fallback() {
        assert_eq!(translate("words containing x").unwrap().contains_character, Some('x'));
        assert_eq!(translate("words containing the y").unwrap().contains_character, Some('y'));
        assert_eq!(translate("words containing zebras").unwrap().contains_character, None);
        assert_eq!(translate("containing").unwrap().contains_character, None);
    }

    #[test]
    fn first_vowel_heuristic() {
        let f = translate("palindromic strings that contain the first vowel").unwrap();
        assert_eq!(f.is_palindrome, Some(true));
        assert_eq!(f.contains_character, Some('a'));

        let containing = translate("strings containing the first vowel").unwrap();
        assert_eq!(containing.contains_character, Some('a'));
    }

    #[test]
    fn first_vowel_needs_contain_the() {
        assert_eq!(translate("the first vowel of the alphabet").unwrap().contains_character, None);
        assert_eq!(translate("strings without the first vowel contained").unwrap().contains_character, None);
    }

    #[test]
    fn patterns_combine() {
        let f = translate("one word palindrome longer than 3 containing the letter e").unwrap();
        assert_eq!(
            f,
            Filter {
                is_palindrome: Some(true),
                word_count: Some(1),
                min_length: Some(4),
                contains_character: Some('e'),
                ..Default::default()
            }
        );
    }

    #[test]
    fn unrecognised_query_yields_empty_filter() {
        assert!(translate("show me everything").unwrap().is_empty());
        assert!(translate("longer than many").unwrap().is_empty());
    }

    #[test]
    fn blank_query_is_invalid_input() {
        for q in ["", "   ", "\n\t"] {
            assert_eq!(
                translate(q).unwrap_err().kind(),
                crate::error::ErrorKind::InvalidInput
            );
        }
    }
}
