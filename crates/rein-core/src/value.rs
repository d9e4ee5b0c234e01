use std::cmp::Ordering;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Numeric bound used by range rules.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Numeric {
    Integer(i64),
    Decimal(f64),
}

impl Numeric {
    pub fn as_f64(self) -> f64 {
        match self {
            Numeric::Integer(value) => value as f64,
            Numeric::Decimal(value) => value,
        }
    }

    pub fn is_finite(self) -> bool {
        match self {
            Numeric::Integer(_) => true,
            Numeric::Decimal(value) => value.is_finite(),
        }
    }

    /// Numeric ordering; integers are compared exactly.
    pub fn compare(self, other: Numeric) -> Option<Ordering> {
        match (self, other) {
            (Numeric::Integer(left), Numeric::Integer(right)) => Some(left.cmp(&right)),
            (left, right) => left.as_f64().partial_cmp(&right.as_f64()),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Integer(value) => write!(f, "{value}"),
            Numeric::Decimal(value) => write!(f, "{value}"),
        }
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::Integer(value)
    }
}

impl From<i32> for Numeric {
    fn from(value: i32) -> Self {
        Numeric::Integer(i64::from(value))
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Decimal(value)
    }
}

/// Literal value embedded in a compiled predicate or held by a sample row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Literal {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Text(String),
}

/// Broad literal category, used to keep inclusion sets homogeneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralType {
    Boolean,
    Numeric,
    Text,
}

impl LiteralType {
    pub fn as_str(self) -> &'static str {
        match self {
            LiteralType::Boolean => "boolean",
            LiteralType::Numeric => "numeric",
            LiteralType::Text => "text",
        }
    }
}

impl Literal {
    pub fn literal_type(&self) -> LiteralType {
        match self {
            Literal::Boolean(_) => LiteralType::Boolean,
            Literal::Integer(_) | Literal::Decimal(_) => LiteralType::Numeric,
            Literal::Text(_) => LiteralType::Text,
        }
    }

    pub fn as_numeric(&self) -> Option<Numeric> {
        match self {
            Literal::Integer(value) => Some(Numeric::Integer(*value)),
            Literal::Decimal(value) => Some(Numeric::Decimal(*value)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Literal::Decimal(value) => value.is_finite(),
            _ => true,
        }
    }

    /// SQL ordering between two literals of the same type.
    ///
    /// Returns `None` when the types are not comparable.
    pub fn compare(&self, other: &Literal) -> Option<Ordering> {
        match (self, other) {
            (Literal::Text(left), Literal::Text(right)) => Some(left.cmp(right)),
            (Literal::Boolean(left), Literal::Boolean(right)) => Some(left.cmp(right)),
            (left, right) => {
                let left = left.as_numeric()?;
                let right = right.as_numeric()?;
                left.compare(right)
            }
        }
    }
}

impl From<Numeric> for Literal {
    fn from(value: Numeric) -> Self {
        match value {
            Numeric::Integer(value) => Literal::Integer(value),
            Numeric::Decimal(value) => Literal::Decimal(value),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Integer(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Decimal(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_numeric_comparison_uses_value() {
        assert_eq!(
            Literal::Integer(2).compare(&Literal::Decimal(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Literal::Decimal(3.0).compare(&Literal::Integer(3)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn text_and_numbers_are_not_comparable() {
        assert_eq!(Literal::from("1").compare(&Literal::Integer(1)), None);
    }

    #[test]
    fn deserializes_untagged_literals() {
        let values: Vec<Literal> =
            serde_json::from_str(r#"[true, 3, 2.5, "on_loan"]"#).expect("parse literals");
        assert_eq!(
            values,
            vec![
                Literal::Boolean(true),
                Literal::Integer(3),
                Literal::Decimal(2.5),
                Literal::Text("on_loan".to_string()),
            ]
        );
    }
}
