//! Validated query statements
//!
//! A [`Statement`] is an immutable `(attribute, operator, value)` triple.
//! Construction checks the value against the operator's rule, so an
//! invalid statement can never exist.

use crate::constraint::Operator;
use crate::error::ValidationError;
use std::str::FromStr;

/// Right-hand side of a statement
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Raw text, sent as-is
    Text(String),
    /// Numeric value
    Number(f64),
    /// Comma-separated list of values
    List(Vec<String>),
    /// Inclusive `min..max` range
    Range(String, String),
}

impl Operand {
    /// Build a list operand
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operand::List(items.into_iter().map(Into::into).collect())
    }

    /// Build a range operand
    pub fn range(from: impl Into<String>, to: impl Into<String>) -> Self {
        Operand::Range(from.into(), to.into())
    }

    /// Numeric view of the operand, if it has one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Operand::Number(n) => Some(*n).filter(|n| n.is_finite()),
            Operand::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            Operand::List(_) | Operand::Range(_, _) => None,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Text(text) => f.write_str(text),
            Operand::Number(n) => write!(f, "{}", n),
            Operand::List(items) => f.write_str(&items.join(",")),
            Operand::Range(from, to) => write!(f, "{}..{}", from, to),
        }
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Operand::Text(value.to_string())
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Operand::Text(value)
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Number(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Number(value as f64)
    }
}

/// A single matching condition, e.g. `temperature>42`
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    left: String,
    operator: Operator,
    right: Operand,
}

impl Statement {
    /// Create a statement, rejecting values the operator does not accept
    pub fn new(
        left_hand_side: impl Into<String>,
        operator: Operator,
        right_hand_side: impl Into<Operand>,
    ) -> Result<Self, ValidationError> {
        let left = left_hand_side.into();
        let right = right_hand_side.into();

        if left.trim().is_empty() {
            return Err(ValidationError::EmptyLeftHandSide);
        }
        if let Operand::Number(n) = right {
            if !n.is_finite() {
                return Err(ValidationError::NonFiniteNumber(n));
            }
        }
        if !operator.accepts(&right) {
            return Err(ValidationError::NonNumericOperand {
                operator: operator.symbol(),
                value: right.to_string(),
            });
        }

        Ok(Self {
            left,
            operator,
            right,
        })
    }

    /// Create a statement from an operator symbol
    pub fn with_symbol(
        left_hand_side: impl Into<String>,
        symbol: &str,
        right_hand_side: impl Into<Operand>,
    ) -> Result<Self, ValidationError> {
        Self::new(left_hand_side, symbol.parse()?, right_hand_side)
    }

    pub fn left_hand_side(&self) -> &str {
        &self.left
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn right_hand_side(&self) -> &Operand {
        &self.right
    }
}

impl std::fmt::Display for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.left, self.operator.symbol(), self.right)
    }
}

impl FromStr for Statement {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::constraint::parser::parse_statement(s)
    }
}

impl TryFrom<(&str, &str, &str)> for Statement {
    type Error = ValidationError;

    fn try_from((left, symbol, right): (&str, &str, &str)) -> Result<Self, Self::Error> {
        Self::with_symbol(left, symbol, right)
    }
}

impl TryFrom<(&str, &str, f64)> for Statement {
    type Error = ValidationError;

    fn try_from((left, symbol, right): (&str, &str, f64)) -> Result<Self, Self::Error> {
        Self::with_symbol(left, symbol, right)
    }
}

impl TryFrom<(String, String, String)> for Statement {
    type Error = ValidationError;

    fn try_from((left, symbol, right): (String, String, String)) -> Result<Self, Self::Error> {
        Self::with_symbol(left, &symbol, right)
    }
}

impl TryFrom<(&str, Operator, Operand)> for Statement {
    type Error = ValidationError;

    fn try_from((left, operator, right): (&str, Operator, Operand)) -> Result<Self, Self::Error> {
        Self::new(left, operator, right)
    }
}
