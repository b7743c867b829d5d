use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_until},
    character::complete::{char, digit1, multispace0, multispace1, none_of},
    combinator::{map, map_res, opt, recognize, rest, value},
    multi::separated_list1,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::filter::FilterQuery;

#[derive(Debug, PartialEq, Clone)]
pub enum Command {
    Analyze { value: String },
    Get { value: String },
    Delete { value: String },
    List { filter: FilterQuery },
    Find { query: String },
    Help,
    Exit,
}

/// One `LIST ... WHERE` condition
#[derive(Debug, PartialEq, Clone)]
enum Condition {
    Palindrome(bool),
    MinLength(i64),
    MaxLength(i64),
    Words(i64),
    Contains(String),
}

// --- BASIC PARSERS ---

fn parse_i64(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i64>())(input)
}

fn parse_quoted_string(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, content) = take_until("\"")(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content.to_string()))
}

fn parse_quoted_char(input: &str) -> IResult<&str, String> {
    map(delimited(char('\''), none_of("'"), char('\'')), String::from)(input)
}

// --- HELPERS ---
fn ws<'a, F, O, E: nom::error::ParseError<&'a str>>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O, E>
where F: FnMut(&'a str) -> IResult<&'a str, O, E> {
    delimited(multispace0, inner, multispace0)
}

fn tag_ci(t: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input| tag_no_case(t)(input)
}

// --- CONDITIONS ---

fn parse_condition(input: &str) -> IResult<&str, Condition> {
    alt((
        value(Condition::Palindrome(false), tuple((tag_ci("NOT"), multispace1, tag_ci("PALINDROME")))),
        value(Condition::Palindrome(true), tag_ci("PALINDROME")),
        map(preceded(tuple((tag_ci("LENGTH"), ws(tag_ci(">=")))), parse_i64), Condition::MinLength),
        map(preceded(tuple((tag_ci("LENGTH"), ws(tag_ci("<=")))), parse_i64), Condition::MaxLength),
        map(preceded(tuple((tag_ci("WORDS"), ws(char('=')))), parse_i64), Condition::Words),
        map(preceded(pair(tag_ci("CONTAINS"), multispace1), parse_quoted_char), Condition::Contains),
    ))(input)
}

fn build_filter(conditions: Vec<Condition>) -> FilterQuery {
    let mut filter = FilterQuery::default();
    for cond in conditions {
        match cond {
            Condition::Palindrome(p) => filter.is_palindrome = Some(p),
            Condition::MinLength(n) => filter.min_length = Some(n),
            Condition::MaxLength(n) => filter.max_length = Some(n),
            Condition::Words(n) => filter.word_count = Some(n),
            Condition::Contains(c) => filter.contains_character = Some(c),
        }
    }
    filter
}

// --- COMMAND PARSERS ---

fn parse_analyze(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("ANALYZE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, value) = parse_quoted_string(input)?;
    Ok((input, Command::Analyze { value }))
}

fn parse_get(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("GET")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, value) = parse_quoted_string(input)?;
    Ok((input, Command::Get { value }))
}

fn parse_delete(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("DELETE")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, value) = parse_quoted_string(input)?;
    Ok((input, Command::Delete { value }))
}

fn parse_list(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("LIST")(input)?;
    let (input, conditions) = opt(preceded(
        ws(tag_ci("WHERE")),
        separated_list1(ws(tag_ci("AND")), parse_condition),
    ))(input)?;
    Ok((input, Command::List { filter: build_filter(conditions.unwrap_or_default()) }))
}

fn parse_find(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("FIND")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, query) = rest(input)?;
    Ok((input, Command::Find { query: query.trim().to_string() }))
}

fn parse_help(input: &str) -> IResult<&str, Command> {
    let (input, _) = tag_ci("HELP")(input)?;
    Ok((input, Command::Help))
}

fn parse_exit(input: &str) -> IResult<&str, Command> {
    let (input, _) = alt((tag_ci("EXIT"), tag_ci("QUIT")))(input)?;
    Ok((input, Command::Exit))
}

pub fn parse_command(input: &str) -> Result<Command, String> {
    let input = input.trim();
    let result = alt((
        parse_analyze,
        parse_get,
        parse_delete,
        parse_list,
        parse_find,
        parse_help,
        parse_exit,
    ))(input);

    match result {
        Ok((remainder, cmd)) => {
            if !remainder.trim().is_empty() {
                return Err(format!("Unexpected tokens at end: '{}'", remainder));
            }
            Ok(cmd)
        },
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let context: String = e.input.chars().take(20).collect();
            if context.len() < e.input.len() {
                Err(format!("Invalid syntax near: '{}...'", context))
            } else {
                Err(format!("Invalid syntax near: '{}'", context))
            }
        },
        Err(nom::Err::Incomplete(_)) => Err("Incomplete command.".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_commands_keep_inner_whitespace() {
        assert_eq!(
            parse_command(r#"analyze "  hello  world ""#),
            Ok(Command::Analyze { value: "  hello  world ".to_string() })
        );
        assert_eq!(
            parse_command(r#"GET "Level""#),
            Ok(Command::Get { value: "Level".to_string() })
        );
        assert_eq!(
            parse_command(r#"DELETE """#),
            Ok(Command::Delete { value: String::new() })
        );
    }

    #[test]
    fn bare_list_has_no_filters() {
        assert_eq!(parse_command("LIST"), Ok(Command::List { filter: FilterQuery::default() }));
    }

    #[test]
    fn list_with_conditions() {
        let cmd = parse_command("list where palindrome and length >= 3 and length <= 9 and words = 1 and contains 'z'").unwrap();
        assert_eq!(
            cmd,
            Command::List {
                filter: FilterQuery {
                    is_palindrome: Some(true),
                    min_length: Some(3),
                    max_length: Some(9),
                    word_count: Some(1),
                    contains_character: Some("z".to_string()),
                }
            }
        );
    }

    #[test]
    fn list_passes_negative_bounds_through() {
        let cmd = parse_command("LIST WHERE NOT PALINDROME AND LENGTH >= -1").unwrap();
        assert_eq!(
            cmd,
            Command::List {
                filter: FilterQuery {
                    is_palindrome: Some(false),
                    min_length: Some(-1),
                    ..Default::default()
                }
            }
        );
    }

    #[test]
    fn find_takes_rest_of_line() {
        assert_eq!(
            parse_command("FIND all single word palindromic strings  "),
            Ok(Command::Find { query: "all single word palindromic strings".to_string() })
        );
    }

    #[test]
    fn help_and_exit() {
        assert_eq!(parse_command("help"), Ok(Command::Help));
        assert_eq!(parse_command("QUIT"), Ok(Command::Exit));
        assert_eq!(parse_command("exit"), Ok(Command::Exit));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_command("ANALYZE hello").is_err());
        assert!(parse_command("LIST WHERE LENGTH > 3").is_err());
        assert!(parse_command("HELP me").unwrap_err().starts_with("Unexpected tokens"));
        assert!(parse_command("SELECT *").unwrap_err().starts_with("Invalid syntax"));
    }
}
