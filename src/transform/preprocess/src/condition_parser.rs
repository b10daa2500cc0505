use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{digit1, hex_digit1, space0};
use nom::combinator::{map, map_res, recognize};
use nom::error::{Error, ErrorKind};
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;
use crate::preprocess::PreprocessErrorReason;

type ConditionResult<'a> = IResult<&'a str, i64>;

fn number(input: &str) -> ConditionResult {
    alt((map_res(preceded(alt((tag("0x"), tag("0X"))), hex_digit1),
                 |digits| i64::from_str_radix(digits, 16)),
         map_res(digit1, |digits: &str| {
             if digits.len() > 1 && digits.starts_with('0') {
                 i64::from_str_radix(&digits[1..], 8)
             } else {
                 digits.parse::<i64>()
             }
         })))(input)
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// Macros have already been substituted, so any remaining name is undefined
fn undefined_name(input: &str) -> ConditionResult {
    map(recognize(pair(take_while1(is_identifier_start), take_while(is_identifier_char))),
        |_| 0)(input)
}

fn primary(input: &str) -> ConditionResult {
    preceded(space0,
             alt((number,
                  undefined_name,
                  delimited(tag("("), expression, preceded(space0, tag(")"))))))(input)
}

fn unary(input: &str) -> ConditionResult {
    let (rest, _) = space0(input)?;
    if let Ok((rest, op)) = alt((tag::<_, _, Error<&str>>("!"),
                                 tag("-"),
                                 tag("+"),
                                 tag("~")))(rest) {
        let (rest, value) = unary(rest)?;
        let value = match op {
            "!" => (value == 0) as i64,
            "-" => value.wrapping_neg(),
            "~" => !value,
            _ => value,
        };
        return Ok((rest, value));
    }
    primary(rest)
}

/// Parse a left associative chain of binary operators at one precedence level
fn chain<'a>(input: &'a str,
             operators: &[&'static str],
             operand: fn(&'a str) -> ConditionResult<'a>)
             -> ConditionResult<'a> {
    let (mut input, mut value) = operand(input)?;
    'outer: loop {
        let (trimmed, _) = space0(input)?;
        for op in operators {
            if let Ok((rest, _)) = tag::<_, _, Error<&str>>(*op)(trimmed) {
                // Do not read the first half of a longer operator
                if (*op == "<" || *op == ">") && rest.starts_with('=') {
                    continue;
                }
                if (*op == "&" || *op == "|") && rest.starts_with(*op) {
                    continue;
                }
                let (rest, right) = operand(rest)?;
                value = match apply(op, value, right) {
                    Some(value) => value,
                    None => return Err(nom::Err::Failure(Error::new(trimmed, ErrorKind::Verify))),
                };
                input = rest;
                continue 'outer;
            }
        }
        return Ok((input, value));
    }
}

fn apply(op: &str, left: i64, right: i64) -> Option<i64> {
    Some(match op {
        "*" => left.wrapping_mul(right),
        "/" => left.checked_div(right)?,
        "%" => left.checked_rem(right)?,
        "+" => left.wrapping_add(right),
        "-" => left.wrapping_sub(right),
        "<" => (left < right) as i64,
        ">" => (left > right) as i64,
        "<=" => (left <= right) as i64,
        ">=" => (left >= right) as i64,
        "==" => (left == right) as i64,
        "!=" => (left != right) as i64,
        "&&" => (left != 0 && right != 0) as i64,
        "||" => (left != 0 || right != 0) as i64,
        _ => unreachable!("unknown condition operator {}", op),
    })
}

fn multiplicative(input: &str) -> ConditionResult {
    chain(input, &["*", "/", "%"], unary)
}

fn additive(input: &str) -> ConditionResult {
    chain(input, &["+", "-"], multiplicative)
}

fn relational(input: &str) -> ConditionResult {
    chain(input, &["<=", ">=", "<", ">"], additive)
}

fn equality(input: &str) -> ConditionResult {
    chain(input, &["==", "!="], relational)
}

fn logical_and(input: &str) -> ConditionResult {
    chain(input, &["&&"], equality)
}

fn expression(input: &str) -> ConditionResult {
    chain(input, &["||"], logical_and)
}

/// Evaluate a fully macro-substituted #if condition
pub fn parse(condition: &str) -> Result<bool, PreprocessErrorReason> {
    match expression(condition) {
        Ok((rest, value)) if rest.trim().is_empty() => Ok(value != 0),
        _ => Err(PreprocessErrorReason::FailedToParseIfCondition(condition.to_string())),
    }
}

#[test]
fn test_condition_parser() {
    assert_eq!(parse("0").unwrap(), false);
    assert_eq!(parse("1").unwrap(), true);
    assert_eq!(parse("!0").unwrap(), true);
    assert_eq!(parse("!1").unwrap(), false);
    assert_eq!(parse("100 >= 100").unwrap(), true);
    assert_eq!(parse("(1 + 2) * 3 == 9").unwrap(), true);
    assert_eq!(parse("1 && 0 || 1").unwrap(), true);
    assert_eq!(parse("2 < 1").unwrap(), false);
    assert_eq!(parse("0x10 == 16").unwrap(), true);
    assert_eq!(parse("010 == 8").unwrap(), true);
    assert_eq!(parse("UNDEFINED").unwrap(), false);
    assert_eq!(parse("-1 < 0").unwrap(), true);
    assert!(parse("1 / 0").is_err());
    assert!(parse("(1").is_err());
    assert!(parse("1 1").is_err());
}
