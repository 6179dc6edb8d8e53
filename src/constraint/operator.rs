//! Comparison operators of the simple query language
//!
//! Each operator carries its wire symbol and the rule its right-hand side
//! must satisfy. Both live in a single lookup table indexed by variant.

use crate::constraint::Operand;
use crate::error::ValidationError;
use std::str::FromStr;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Single value, comma-separated list or `min..max` range
    Equal,
    /// Negation of [`Operator::Equal`]
    Unequal,
    /// Strictly greater than a number
    GreaterThan,
    /// Strictly less than a number
    LessThan,
    /// Greater than or equal to a number
    GreaterOrEqual,
    /// Less than or equal to a number
    LessOrEqual,
    /// Regular expression evaluated by the remote service
    MatchPattern,
}

/// Predicate a right-hand side must satisfy for a given operator
type OperandRule = fn(&Operand) -> bool;

struct OperatorEntry {
    operator: Operator,
    symbol: &'static str,
    numeric_only: bool,
    accepts: OperandRule,
}

// Order matches the enum discriminants.
const OPERATOR_TABLE: [OperatorEntry; 7] = [
    OperatorEntry {
        operator: Operator::Equal,
        symbol: "==",
        numeric_only: false,
        accepts: any_operand,
    },
    OperatorEntry {
        operator: Operator::Unequal,
        symbol: "!=",
        numeric_only: false,
        accepts: any_operand,
    },
    OperatorEntry {
        operator: Operator::GreaterThan,
        symbol: ">",
        numeric_only: true,
        accepts: numeric_operand,
    },
    OperatorEntry {
        operator: Operator::LessThan,
        symbol: "<",
        numeric_only: true,
        accepts: numeric_operand,
    },
    OperatorEntry {
        operator: Operator::GreaterOrEqual,
        symbol: ">=",
        numeric_only: true,
        accepts: numeric_operand,
    },
    OperatorEntry {
        operator: Operator::LessOrEqual,
        symbol: "<=",
        numeric_only: true,
        accepts: numeric_operand,
    },
    OperatorEntry {
        operator: Operator::MatchPattern,
        symbol: "~=",
        numeric_only: false,
        accepts: any_operand,
    },
];

fn any_operand(_: &Operand) -> bool {
    true
}

fn numeric_operand(operand: &Operand) -> bool {
    operand.as_number().is_some()
}

impl Operator {
    /// Every operator, in table order
    pub const ALL: [Operator; 7] = [
        Operator::Equal,
        Operator::Unequal,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterOrEqual,
        Operator::LessOrEqual,
        Operator::MatchPattern,
    ];

    fn entry(self) -> &'static OperatorEntry {
        &OPERATOR_TABLE[self as usize]
    }

    /// Wire symbol, e.g. `>=`
    pub fn symbol(self) -> &'static str {
        self.entry().symbol
    }

    /// Look up an operator by its wire symbol
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        OPERATOR_TABLE
            .iter()
            .find(|entry| entry.symbol == symbol)
            .map(|entry| entry.operator)
    }

    /// Whether the right-hand side must parse as a number
    pub fn requires_number(self) -> bool {
        self.entry().numeric_only
    }

    /// Check a right-hand side against this operator's rule
    pub fn accepts(self, operand: &Operand) -> bool {
        (self.entry().accepts)(operand)
    }
}

impl FromStr for Operator {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_symbol(s).ok_or_else(|| ValidationError::UnknownOperator(s.to_string()))
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
