use thiserror::Error;

/// A rule whose parameters violate the rule model invariants.
///
/// Raised at construction time, before any SQL is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rule: {field}: {reason}")]
pub struct InvalidRuleError {
    /// Offending field (e.g. `target`, `max`, `pattern`).
    pub field: String,
    pub reason: String,
}

impl InvalidRuleError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// A rule kind/parameter combination with no SQL mapping for the dialect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} rule: {reason}")]
pub struct UnsupportedRuleError {
    pub kind: String,
    pub reason: String,
}

impl UnsupportedRuleError {
    pub fn new(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

/// Two distinct rules resolved to the same constraint name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("constraint name {name} is claimed by two different rules: {first} and {second}")]
pub struct NameCollisionError {
    pub name: String,
    pub first: String,
    pub second: String,
}

/// Failure while evaluating a predicate against a sample row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Operands of incompatible types (e.g. text compared with a number).
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// The embedded pattern could not be compiled by the evaluator.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Core error type shared across rein crates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidRule(#[from] InvalidRuleError),
    #[error(transparent)]
    UnsupportedRule(#[from] UnsupportedRuleError),
    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Convenience alias for results returned by rein crates.
pub type Result<T> = std::result::Result<T, Error>;
