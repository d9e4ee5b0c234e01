//! Core contracts for rein.
//!
//! Declarative data-integrity rules, the predicate compiler that turns them
//! into PostgreSQL CHECK expressions, and the deterministic constraint namer.
//! Nothing here performs I/O.

pub mod compile;
pub mod dialect;
pub mod error;
pub mod eval;
pub mod expr;
pub mod naming;
pub mod rule;
pub mod table;
pub mod value;

pub use compile::{
    CompiledPredicate, build_predicate, compile, compile_predicate, predicate_fingerprint,
};
pub use dialect::{Dialect, POSTGRES_MAX_IDENTIFIER_LEN};
pub use error::{
    Error, EvalError, InvalidRuleError, NameCollisionError, Result, UnsupportedRuleError,
};
pub use eval::{Row, check_passes};
pub use expr::{Expr, quote_ident, quote_literal};
pub use naming::{ConstraintName, DEFAULT_PREFIX, Namer};
pub use rule::{
    CompareOp, Condition, ConditionalRule, FormatMode, FormatRule, InclusionRule, LengthRule,
    Parity, ParityRule, PresenceRule, RangeRule, Rule, RuleKind, RuleSpec, ValueClass,
};
pub use table::TableRef;
pub use value::{Literal, LiteralType, Numeric};

/// Current contract version for rules documents.
pub const RULES_VERSION: &str = "0.1";
