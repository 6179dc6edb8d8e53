//! Statement Parser
//!
//! Parses statement text such as `temperature>=20` or `color!=black,red`
//! into a validated [`Statement`].
//!
//! The attribute runs up to the first operator character; the longest
//! matching operator symbol wins, and everything after it is the value.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    combinator::{rest, value},
    sequence::tuple,
    IResult,
};

use crate::constraint::{Operand, Operator, Statement};
use crate::error::ValidationError;

/// Parse a single statement
pub fn parse_statement(input: &str) -> Result<Statement, ValidationError> {
    let trimmed = input.trim();

    let (left, operator, right) = match parse_parts(trimmed) {
        Ok((_, parts)) => parts,
        Err(_) => return Err(ValidationError::InvalidStatement(trimmed.to_string())),
    };

    let right = right.trim();
    if right.is_empty() {
        return Err(ValidationError::InvalidStatement(trimmed.to_string()));
    }

    Statement::new(left.trim(), operator, parse_operand(operator, right))
}

fn parse_parts(input: &str) -> IResult<&str, (&str, Operator, &str)> {
    tuple((parse_attribute, parse_operator, rest))(input)
}

fn parse_attribute(input: &str) -> IResult<&str, &str> {
    take_till1(|c| matches!(c, '=' | '!' | '<' | '>' | '~'))(input)
}

fn parse_operator(input: &str) -> IResult<&str, Operator> {
    // Two-character symbols first so `>=` is not read as `>`
    alt((
        value(Operator::Equal, tag("==")),
        value(Operator::Unequal, tag("!=")),
        value(Operator::GreaterOrEqual, tag(">=")),
        value(Operator::LessOrEqual, tag("<=")),
        value(Operator::MatchPattern, tag("~=")),
        value(Operator::GreaterThan, tag(">")),
        value(Operator::LessThan, tag("<")),
    ))(input)
}

fn parse_operand(operator: Operator, text: &str) -> Operand {
    if operator == Operator::MatchPattern {
        return Operand::from(text);
    }

    if let Some((from, to)) = text.split_once("..") {
        if !from.is_empty() && !to.is_empty() {
            return Operand::range(from, to);
        }
    }

    if text.contains(',') {
        return Operand::list(text.split(',').map(str::trim));
    }

    Operand::from(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let statement: Statement = "temperature>42".parse().unwrap();
        assert_eq!(statement.left_hand_side(), "temperature");
        assert_eq!(statement.operator(), Operator::GreaterThan);
        assert_eq!(statement.right_hand_side(), &Operand::from("42"));
    }

    #[test]
    fn test_parse_prefers_longest_symbol() {
        let statement = parse_statement("temperature >= 20").unwrap();
        assert_eq!(statement.operator(), Operator::GreaterOrEqual);
        assert_eq!(statement.to_string(), "temperature>=20");
    }

    #[test]
    fn test_parse_list_and_range() {
        let statement = parse_statement("color!=black,red").unwrap();
        assert_eq!(statement.right_hand_side(), &Operand::list(["black", "red"]));

        let statement = parse_statement("temperature==10..20").unwrap();
        assert_eq!(statement.right_hand_side(), &Operand::range("10", "20"));
    }

    #[test]
    fn test_parse_pattern_keeps_text() {
        let statement = parse_statement("name~=^Room[0-9]+,x$").unwrap();
        assert_eq!(statement.right_hand_side(), &Operand::from("^Room[0-9]+,x$"));
    }

    #[test]
    fn test_parse_failures() {
        assert!(matches!(
            parse_statement("temperature"),
            Err(ValidationError::InvalidStatement(_))
        ));
        assert!(matches!(
            parse_statement(">42"),
            Err(ValidationError::InvalidStatement(_))
        ));
        assert!(matches!(
            parse_statement("temperature=="),
            Err(ValidationError::InvalidStatement(_))
        ));
        assert!(matches!(
            parse_statement("temperature<warm"),
            Err(ValidationError::NonNumericOperand { .. })
        ));
    }
}
