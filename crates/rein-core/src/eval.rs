//! Three-valued evaluation of compiled predicates against sample rows.
//!
//! Mirrors how PostgreSQL evaluates the subset of SQL the compiler emits, so
//! a rule can be checked without a database. Regular expressions run on the
//! `regex` crate, which agrees with PostgreSQL's engine on the syntax rules
//! accept (anchors, classes, repetition, alternation).

use std::cmp::Ordering;
use std::collections::BTreeMap;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::expr::Expr;
use crate::value::Literal;

/// A sample row; absent columns and explicit `None` both read as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    values: BTreeMap<String, Option<Literal>>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Literal>) -> Self {
        self.values.insert(column.into(), Some(value.into()));
        self
    }

    /// Builder-style NULL setter.
    pub fn with_null(mut self, column: impl Into<String>) -> Self {
        self.values.insert(column.into(), None);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: Option<Literal>) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&Literal> {
        self.values.get(column).and_then(Option::as_ref)
    }
}

/// Whether a CHECK constraint with this predicate accepts the row.
///
/// CHECK constraints pass when the predicate is true or NULL.
pub fn check_passes(expr: &Expr, row: &Row) -> Result<bool, EvalError> {
    Ok(expr.evaluate(row)? != Some(false))
}

impl Expr {
    /// Evaluate as a boolean; `None` is SQL NULL.
    pub fn evaluate(&self, row: &Row) -> Result<Option<bool>, EvalError> {
        match self {
            Expr::Column(_) | Expr::Literal(_) | Expr::Modulo { .. } | Expr::CharLength(_) => {
                match self.scalar(row)? {
                    None => Ok(None),
                    Some(Literal::Boolean(value)) => Ok(Some(value)),
                    Some(other) => Err(EvalError::TypeMismatch(format!(
                        "expected a boolean, found {other:?}"
                    ))),
                }
            }
            Expr::Compare { left, op, right } => {
                let (Some(left), Some(right)) = (left.scalar(row)?, right.scalar(row)?) else {
                    return Ok(None);
                };
                let ordering = compare(&left, &right)?;
                Ok(Some(op.holds(ordering)))
            }
            Expr::Between { expr, low, high } => {
                let Some(value) = expr.scalar(row)? else {
                    return Ok(None);
                };
                let low = compare(&value, &Literal::from(*low))?;
                let high = compare(&value, &Literal::from(*high))?;
                Ok(Some(low != Ordering::Less && high != Ordering::Greater))
            }
            Expr::InList { expr, values } => {
                let Some(value) = expr.scalar(row)? else {
                    return Ok(None);
                };
                for candidate in values {
                    if compare(&value, candidate)? == Ordering::Equal {
                        return Ok(Some(true));
                    }
                }
                Ok(Some(false))
            }
            Expr::RegexMatch {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                let Some(value) = expr.scalar(row)? else {
                    return Ok(None);
                };
                let Literal::Text(text) = value else {
                    return Err(EvalError::TypeMismatch(format!(
                        "regular expressions only match text, found {value:?}"
                    )));
                };
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|err| EvalError::InvalidPattern(err.to_string()))?;
                Ok(Some(regex.is_match(&text) != *negated))
            }
            Expr::IsNull { expr, negated } => {
                let is_null = expr.scalar(row)?.is_none();
                Ok(Some(is_null != *negated))
            }
            Expr::Coalesce { expr, fallback } => Ok(Some(expr.evaluate(row)?.unwrap_or(*fallback))),
            Expr::Not(expr) => Ok(expr.evaluate(row)?.map(|value| !value)),
            Expr::And(items) => {
                let mut unknown = false;
                for item in items {
                    match item.evaluate(row)? {
                        Some(false) => return Ok(Some(false)),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                Ok(if unknown { None } else { Some(true) })
            }
            Expr::Or(items) => {
                let mut unknown = false;
                for item in items {
                    match item.evaluate(row)? {
                        Some(true) => return Ok(Some(true)),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                Ok(if unknown { None } else { Some(false) })
            }
        }
    }

    fn scalar(&self, row: &Row) -> Result<Option<Literal>, EvalError> {
        match self {
            Expr::Column(name) => Ok(row.get(name).cloned()),
            Expr::Literal(value) => Ok(Some(value.clone())),
            Expr::Modulo { expr, divisor } => {
                if *divisor == 0 {
                    return Err(EvalError::TypeMismatch("division by zero".to_string()));
                }
                match expr.scalar(row)? {
                    None => Ok(None),
                    Some(Literal::Integer(value)) => Ok(Some(Literal::Integer(value % divisor))),
                    Some(Literal::Decimal(value)) => {
                        Ok(Some(Literal::Decimal(value % *divisor as f64)))
                    }
                    Some(other) => Err(EvalError::TypeMismatch(format!(
                        "modulo needs a number, found {other:?}"
                    ))),
                }
            }
            Expr::CharLength(expr) => match expr.scalar(row)? {
                None => Ok(None),
                Some(Literal::Text(text)) => Ok(Some(Literal::Integer(text.chars().count() as i64))),
                Some(other) => Err(EvalError::TypeMismatch(format!(
                    "char_length needs text, found {other:?}"
                ))),
            },
            _ => Ok(self.evaluate(row)?.map(Literal::Boolean)),
        }
    }
}

fn compare(left: &Literal, right: &Literal) -> Result<Ordering, EvalError> {
    left.compare(right).ok_or_else(|| {
        EvalError::TypeMismatch(format!("cannot compare {left:?} with {right:?}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::CompareOp;

    #[test]
    fn comparisons_against_null_are_unknown() {
        let expr = Expr::column("n").compare(CompareOp::Ge, Expr::literal(1));
        assert_eq!(expr.evaluate(&Row::new()).expect("evaluate"), None);
        assert!(check_passes(&expr, &Row::new()).expect("evaluate"));
    }

    #[test]
    fn and_or_follow_three_valued_logic() {
        let unknown = Expr::column("n").compare(CompareOp::Eq, Expr::literal(1));
        let row = Row::new().with_null("n");

        let false_and_unknown = Expr::And(vec![Expr::literal(false), unknown.clone()]);
        assert_eq!(false_and_unknown.evaluate(&row).expect("evaluate"), Some(false));

        let true_or_unknown = Expr::Or(vec![unknown.clone(), Expr::literal(true)]);
        assert_eq!(true_or_unknown.evaluate(&row).expect("evaluate"), Some(true));

        let true_and_unknown = Expr::And(vec![Expr::literal(true), unknown]);
        assert_eq!(true_and_unknown.evaluate(&row).expect("evaluate"), None);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let expr = Expr::column("n").compare(CompareOp::Ge, Expr::literal(1));
        let row = Row::new().with("n", "one");
        assert!(matches!(expr.evaluate(&row), Err(EvalError::TypeMismatch(_))));
    }

    #[test]
    fn deserializes_rows_with_nulls() {
        let row: Row =
            serde_json::from_str(r#"{"state": "on_loan", "due_date": null}"#).expect("parse row");
        assert_eq!(row.get("state"), Some(&Literal::from("on_loan")));
        assert_eq!(row.get("due_date"), None);
    }
}
