//! Predicate AST and SQL rendering.
//!
//! The compiler builds an [`Expr`] tree; `Display` renders it as a
//! PostgreSQL boolean expression and [`crate::eval`] evaluates it against a
//! sample row with SQL three-valued logic.

use std::fmt;

use crate::rule::CompareOp;
use crate::value::{Literal, Numeric};

/// A boolean or scalar SQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference.
    Column(String),
    /// Literal value.
    Literal(Literal),
    /// `left op right`
    Compare {
        left: Box<Expr>,
        op: CompareOp,
        right: Box<Expr>,
    },
    /// `expr % divisor`
    Modulo { expr: Box<Expr>, divisor: i64 },
    /// `char_length(expr)`
    CharLength(Box<Expr>),
    /// `expr BETWEEN low AND high`
    Between {
        expr: Box<Expr>,
        low: Numeric,
        high: Numeric,
    },
    /// `expr IN (v1, v2, ...)`
    InList { expr: Box<Expr>, values: Vec<Literal> },
    /// `expr ~ pattern` and its negated / case-insensitive forms.
    RegexMatch {
        expr: Box<Expr>,
        pattern: String,
        negated: bool,
        case_insensitive: bool,
    },
    /// `expr IS NULL` / `expr IS NOT NULL`
    IsNull { expr: Box<Expr>, negated: bool },
    /// `COALESCE(expr, fallback)`
    Coalesce { expr: Box<Expr>, fallback: bool },
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Expr::Literal(value.into())
    }

    pub fn compare(self, op: CompareOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn modulo(self, divisor: i64) -> Self {
        Expr::Modulo {
            expr: Box::new(self),
            divisor,
        }
    }

    pub fn char_length(self) -> Self {
        Expr::CharLength(Box::new(self))
    }

    pub fn between(self, low: Numeric, high: Numeric) -> Self {
        Expr::Between {
            expr: Box::new(self),
            low,
            high,
        }
    }

    pub fn in_list(self, values: Vec<Literal>) -> Self {
        Expr::InList {
            expr: Box::new(self),
            values,
        }
    }

    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    pub fn coalesce(self, fallback: bool) -> Self {
        Expr::Coalesce {
            expr: Box::new(self),
            fallback,
        }
    }

    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Conjunction; a single operand is returned unchanged.
    pub fn all(mut items: Vec<Expr>) -> Self {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::And(items)
        }
    }

    /// Disjunction; a single operand is returned unchanged.
    pub fn any(mut items: Vec<Expr>) -> Self {
        if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Or(items)
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Expr::And(_) | Expr::Or(_))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "{}", Ident(name)),
            Expr::Literal(value) => write_literal(f, value),
            Expr::Compare { left, op, right } => {
                write!(f, "{left} {} {right}", op.as_str())
            }
            Expr::Modulo { expr, divisor } => write!(f, "{expr} % {divisor}"),
            Expr::CharLength(expr) => write!(f, "char_length({expr})"),
            Expr::Between { expr, low, high } => write!(f, "{expr} BETWEEN {low} AND {high}"),
            Expr::InList { expr, values } => {
                write!(f, "{expr} IN (")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write_literal(f, value)?;
                }
                write!(f, ")")
            }
            Expr::RegexMatch {
                expr,
                pattern,
                negated,
                case_insensitive,
            } => {
                let op = match (negated, case_insensitive) {
                    (false, false) => "~",
                    (false, true) => "~*",
                    (true, false) => "!~",
                    (true, true) => "!~*",
                };
                write!(f, "{expr} {op} {}", Lit(pattern))
            }
            Expr::IsNull { expr, negated } => {
                let suffix = if *negated { "IS NOT NULL" } else { "IS NULL" };
                write!(f, "{expr} {suffix}")
            }
            Expr::Coalesce { expr, fallback } => {
                let fallback = if *fallback { "TRUE" } else { "FALSE" };
                write!(f, "COALESCE({expr}, {fallback})")
            }
            Expr::Not(expr) => {
                if expr.is_compound() {
                    write!(f, "NOT ({expr})")
                } else {
                    write!(f, "NOT {expr}")
                }
            }
            Expr::And(items) => write_joined(f, items, "AND"),
            Expr::Or(items) => write_joined(f, items, "OR"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr], keyword: &str) -> fmt::Result {
    for (idx, item) in items.iter().enumerate() {
        if idx > 0 {
            write!(f, " {keyword} ")?;
        }
        if item.is_compound() {
            write!(f, "({item})")?;
        } else {
            write!(f, "{item}")?;
        }
    }
    Ok(())
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Literal) -> fmt::Result {
    match value {
        Literal::Boolean(true) => write!(f, "TRUE"),
        Literal::Boolean(false) => write!(f, "FALSE"),
        Literal::Integer(value) => write!(f, "{value}"),
        Literal::Decimal(value) => write!(f, "{value}"),
        Literal::Text(value) => write!(f, "{}", Lit(value)),
    }
}

/// A PostgreSQL string literal.
///
/// Single quotes are doubled. Values containing a backslash use the `E''`
/// form with backslashes doubled, so the result does not depend on
/// `standard_conforming_strings`.
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0.as_ref();
        let escape_backslash = value.contains('\\');
        if escape_backslash {
            write!(f, "E")?;
        }
        write!(f, "'")?;
        for ch in value.chars() {
            match ch {
                '\'' => write!(f, "''")?,
                '\\' if escape_backslash => write!(f, "\\\\")?,
                ch => write!(f, "{ch}")?,
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier, quoted only when it has to be.
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.0.as_ref();
        if is_bare_identifier(name) {
            return write!(f, "{name}");
        }
        write!(f, "\"")?;
        for ch in name.chars() {
            if ch == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{ch}")?;
            }
        }
        write!(f, "\"")
    }
}

/// Escape and quote a string literal.
pub fn quote_literal(value: &str) -> String {
    Lit(value).to_string()
}

/// Quote an identifier when it is not a plain lower-case name.
pub fn quote_ident(name: &str) -> String {
    Ident(name).to_string()
}

const RESERVED: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "table", "then", "to",
    "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
];

/// Keywords reserved everywhere except as function or type names.
const TYPE_FUNC_RESERVED: &[&str] = &[
    "authorization", "binary", "collation", "concurrently", "cross", "current_schema",
    "freeze", "full", "ilike", "inner", "is", "isnull", "join", "left", "like", "natural",
    "notnull", "outer", "overlaps", "right", "similar", "tablesample", "verbose",
];

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_lowercase() || first == '_') {
        return false;
    }
    if !chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' || ch == '$')
    {
        return false;
    }
    !RESERVED.contains(&name) && !TYPE_FUNC_RESERVED.contains(&name)
}
