//! Simple Query Language
//!
//! Builds the filter expressions QuantumLeap and Orion accept in the `q`
//! parameter. A query is a list of statements separated by `;`, and an
//! entity matches when it satisfies all of them.
//!
//! ```text
//! temperature>42
//! color!=black,red
//! temperature==10..20;color~=ow
//! ```
//!
//! # Example
//!
//! ```rust
//! use quantumleap_client::constraint::{create_query, Operator, Statement};
//!
//! let query = create_query([
//!     Statement::new("temperature", Operator::GreaterThan, 20.0)?,
//!     Statement::with_symbol("color", "!=", "black")?,
//! ])?;
//! assert_eq!(query, "temperature>20;color!=black");
//! # Ok::<(), quantumleap_client::ValidationError>(())
//! ```

mod operator;
mod parser;
mod statement;

pub use operator::Operator;
pub use parser::parse_statement;
pub use statement::{Operand, Statement};

use crate::error::ValidationError;

/// Join statements into a query string
///
/// Accepts anything convertible into a [`Statement`]: built statements or
/// raw `(attribute, symbol, value)` triples. Structurally equal statements
/// collapse into one; the first occurrence keeps its position.
pub fn create_query<I, S>(statements: I) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: TryInto<Statement>,
    ValidationError: From<S::Error>,
{
    let mut unique: Vec<Statement> = Vec::new();

    for raw in statements {
        let statement: Statement = raw.try_into()?;
        if !unique.contains(&statement) {
            unique.push(statement);
        }
    }

    Ok(unique
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_collapse() {
        let query = create_query([("a", "==", "1"), ("a", "==", "1")]).unwrap();
        assert_eq!(query, "a==1");
    }

    #[test]
    fn test_distinct_statements_joined() {
        let query = create_query([("a", "==", "1"), ("b", "!=", "2")]).unwrap();

        let mut parts: Vec<&str> = query.split(';').collect();
        parts.sort();
        assert_eq!(parts, vec!["a==1", "b!=2"]);
    }

    #[test]
    fn test_first_occurrence_order_kept() {
        let query = create_query([
            ("b", "!=", "2"),
            ("a", "==", "1"),
            ("b", "!=", "2"),
            ("c", "<", "3"),
        ])
        .unwrap();
        assert_eq!(query, "b!=2;a==1;c<3");
    }

    #[test]
    fn test_single_statement() {
        let statement = Statement::with_symbol("temperature", ">", "42").unwrap();
        assert_eq!(create_query([statement]).unwrap(), "temperature>42");
    }

    #[test]
    fn test_invalid_triple_fails_whole_query() {
        let err = create_query([("a", "==", "1"), ("temperature", ">", "warm")]).unwrap_err();
        assert!(matches!(err, ValidationError::NonNumericOperand { .. }));
    }

    #[test]
    fn test_empty_input() {
        let statements: Vec<Statement> = Vec::new();
        assert_eq!(create_query(statements).unwrap(), "");
    }
}
