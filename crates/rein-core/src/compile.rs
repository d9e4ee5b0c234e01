//! Predicate compiler: rule in, boolean SQL expression out.

use sha2::{Digest, Sha256};

use crate::dialect::Dialect;
use crate::error::UnsupportedRuleError;
use crate::expr::Expr;
use crate::rule::{
    CompareOp, Condition, ConditionalRule, FormatMode, FormatRule, LengthRule, Parity, RangeRule,
    Rule, RuleKind, ValueClass,
};
use crate::value::{Literal, Numeric};

/// Compiled form of a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPredicate {
    pub expr: Expr,
    pub sql: String,
}

impl CompiledPredicate {
    /// Stable fingerprint of the rendered SQL (16 hex characters).
    pub fn fingerprint(&self) -> String {
        predicate_fingerprint(&self.sql)
    }
}

/// Compile a rule into its predicate AST and rendered SQL.
pub fn compile(rule: &Rule, dialect: &Dialect) -> Result<CompiledPredicate, UnsupportedRuleError> {
    let expr = build_predicate(rule, dialect)?;
    let sql = expr.to_string();
    Ok(CompiledPredicate { expr, sql })
}

/// Compile a rule straight to its SQL text.
pub fn compile_predicate(rule: &Rule, dialect: &Dialect) -> Result<String, UnsupportedRuleError> {
    Ok(build_predicate(rule, dialect)?.to_string())
}

/// First 16 hex characters of the SHA-256 of a predicate.
pub fn predicate_fingerprint(sql: &str) -> String {
    let digest = Sha256::digest(sql.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Build the predicate AST, including the NULL-handling wrapper.
pub fn build_predicate(rule: &Rule, dialect: &Dialect) -> Result<Expr, UnsupportedRuleError> {
    let target = rule.target();

    if let RuleKind::Conditional(conditional) = rule.kind() {
        return Ok(conditional_predicate(conditional, target));
    }

    let mut per_column = Vec::new();
    for column in target {
        if let Some(body) = column_body(rule.kind(), column, dialect)? {
            let body = if rule.allow_blank() {
                Expr::any(vec![body, blank(column)])
            } else {
                body
            };
            per_column.push(body);
        }
    }

    let body = if per_column.is_empty() {
        None
    } else {
        Some(Expr::all(per_column))
    };

    if rule.allow_null() {
        let Some(body) = body else {
            return Err(UnsupportedRuleError::new(
                rule.kind().name(),
                "allowing NULL leaves nothing to check",
            ));
        };
        let all_null = Expr::all(
            target
                .iter()
                .map(|column| Expr::column(column.as_str()).is_null())
                .collect(),
        );
        return Ok(Expr::Or(vec![body, all_null]));
    }

    let mut guarded: Vec<Expr> = target
        .iter()
        .map(|column| Expr::column(column.as_str()).is_not_null())
        .collect();
    if let Some(body) = body {
        guarded.push(body);
    }
    Ok(Expr::all(guarded))
}

fn column_body(
    kind: &RuleKind,
    column: &str,
    dialect: &Dialect,
) -> Result<Option<Expr>, UnsupportedRuleError> {
    let body = match kind {
        RuleKind::Range(range) => range_body(range, column),
        RuleKind::Parity(parity) => {
            let op = match parity.parity {
                Parity::Even => CompareOp::Eq,
                Parity::Odd => CompareOp::Ne,
            };
            Expr::column(column)
                .modulo(2)
                .compare(op, Expr::literal(0))
        }
        RuleKind::Presence(presence) => match presence.column_type {
            ValueClass::Text => {
                Expr::column(column).compare(CompareOp::Ne, Expr::literal(""))
            }
            ValueClass::NonText => return Ok(None),
        },
        RuleKind::Length(length) => length_body(length, column),
        RuleKind::Inclusion(inclusion) => Expr::column(column).in_list(inclusion.values.clone()),
        RuleKind::Format(format) => format_body(format, column, dialect)?,
        RuleKind::Conditional(_) => {
            return Err(UnsupportedRuleError::new(
                "conditional",
                "conditional rules are compiled as a whole, not per column",
            ));
        }
    };
    Ok(Some(body))
}

fn range_body(range: &RangeRule, column: &str) -> Expr {
    let mut bounds = Vec::new();
    if let Some(min) = range.min {
        let op = if range.min_inclusive {
            CompareOp::Ge
        } else {
            CompareOp::Gt
        };
        bounds.push(Expr::column(column).compare(op, Expr::literal(min)));
    }
    if let Some(max) = range.max {
        let op = if range.max_inclusive {
            CompareOp::Le
        } else {
            CompareOp::Lt
        };
        bounds.push(Expr::column(column).compare(op, Expr::literal(max)));
    }
    Expr::all(bounds)
}

fn length_body(length: &LengthRule, column: &str) -> Expr {
    let measured = Expr::column(column).char_length();
    match (length.min_length, length.max_length) {
        (Some(min), Some(max)) => measured.between(Numeric::Integer(min), Numeric::Integer(max)),
        (Some(min), None) => measured.compare(CompareOp::Ge, Expr::literal(min)),
        (None, Some(max)) => measured.compare(CompareOp::Le, Expr::literal(max)),
        // Rejected at construction; an unbounded length accepts any non-NULL text.
        (None, None) => measured.is_not_null(),
    }
}

fn format_body(
    format: &FormatRule,
    column: &str,
    dialect: &Dialect,
) -> Result<Expr, UnsupportedRuleError> {
    if format.pattern.is_empty() {
        return Err(UnsupportedRuleError::new("format", "empty pattern"));
    }
    if !dialect.regex_match {
        return Err(UnsupportedRuleError::new(
            "format",
            format!("dialect {} has no regular expression match", dialect.name),
        ));
    }
    if format.case_insensitive && !dialect.case_insensitive_regex {
        return Err(UnsupportedRuleError::new(
            "format",
            format!(
                "dialect {} has no case-insensitive regular expression match",
                dialect.name
            ),
        ));
    }

    let (pattern, negated) = match format.mode {
        FormatMode::Accepts => (anchor(&format.pattern), false),
        FormatMode::Rejects => (format.pattern.clone(), true),
    };
    Ok(Expr::RegexMatch {
        expr: Box::new(Expr::column(column)),
        pattern,
        negated,
        case_insensitive: format.case_insensitive,
    })
}

/// Anchor a pattern at both ends so partial matches never satisfy it.
///
/// Patterns that already carry anchors are wrapped too: a top-level
/// alternation such as `^a|b$` anchors each branch at one end only.
fn anchor(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

fn conditional_predicate(conditional: &ConditionalRule, target: &[String]) -> Expr {
    let trigger = Expr::all(conditional.when.iter().map(condition_expr).collect());

    let mut required = Vec::new();
    for column in target {
        required.push(Expr::column(column.as_str()).is_not_null());
        if conditional.reject_blank {
            required.push(Expr::column(column.as_str()).compare(CompareOp::Ne, Expr::literal("")));
        }
    }

    Expr::Or(vec![
        trigger.coalesce(false).not(),
        Expr::all(required),
    ])
}

fn condition_expr(condition: &Condition) -> Expr {
    match condition {
        Condition::Compare {
            column,
            operator,
            value,
        } => Expr::column(column.as_str()).compare(*operator, Expr::Literal(value.clone())),
        Condition::In { column, values } => Expr::column(column.as_str()).in_list(values.clone()),
        Condition::IsNull { column } => Expr::column(column.as_str()).is_null(),
        Condition::IsNotNull { column } => Expr::column(column.as_str()).is_not_null(),
    }
}

fn blank(column: &str) -> Expr {
    Expr::column(column).compare(CompareOp::Eq, Expr::Literal(Literal::Text(String::new())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{FormatRule, InclusionRule, RuleSpec};

    fn sql(spec: RuleSpec) -> String {
        let rule = spec.build().expect("valid rule");
        compile_predicate(&rule, &Dialect::postgres()).expect("compiles")
    }

    #[test]
    fn compiles_closed_range() {
        assert_eq!(
            sql(RuleSpec::new(RangeRule::between(1, 12), ["published_month"])),
            "published_month IS NOT NULL AND (published_month >= 1 AND published_month <= 12)"
        );
    }

    #[test]
    fn compiles_half_open_range_with_null_allowed() {
        assert_eq!(
            sql(RuleSpec::new(RangeRule::between(0, 1.5).inclusive(false, false), ["ratio"])
                .allow_null(true)),
            "(ratio > 0 AND ratio < 1.5) OR ratio IS NULL"
        );
    }

    #[test]
    fn compiles_parity() {
        assert_eq!(
            sql(RuleSpec::new(RuleKind::even(), ["copies"])),
            "copies IS NOT NULL AND copies % 2 = 0"
        );
        assert_eq!(
            sql(RuleSpec::new(RuleKind::odd(), ["copies"])),
            "copies IS NOT NULL AND copies % 2 <> 0"
        );
    }

    #[test]
    fn compiles_presence_for_text_and_non_text() {
        assert_eq!(
            sql(RuleSpec::new(RuleKind::presence(), ["title"])),
            "title IS NOT NULL AND title <> ''"
        );
        assert_eq!(
            sql(RuleSpec::new(RuleKind::non_text_presence(), ["author_id"])),
            "author_id IS NOT NULL"
        );
    }

    #[test]
    fn compiles_length_variants() {
        assert_eq!(
            sql(RuleSpec::new(LengthRule::between(1, 255), ["call_number"]).allow_null(true)),
            "char_length(call_number) BETWEEN 1 AND 255 OR call_number IS NULL"
        );
        assert_eq!(
            sql(RuleSpec::new(LengthRule::at_most(8), ["code"])),
            "code IS NOT NULL AND char_length(code) <= 8"
        );
    }

    #[test]
    fn escapes_inclusion_values() {
        assert_eq!(
            sql(RuleSpec::new(
                InclusionRule::of(["available", "on_loan", "o'hare"]),
                ["state"]
            )),
            "state IS NOT NULL AND state IN ('available', 'on_loan', 'o''hare')"
        );
    }

    #[test]
    fn anchors_format_patterns() {
        assert_eq!(
            sql(RuleSpec::new(FormatRule::accepts("[a-z]+"), ["slug"])),
            "slug IS NOT NULL AND slug ~ '^(?:[a-z]+)$'"
        );
        assert_eq!(
            sql(RuleSpec::new(FormatRule::accepts("^[a-z]+$"), ["slug"])),
            "slug IS NOT NULL AND slug ~ '^(?:^[a-z]+$)$'"
        );
        assert_eq!(
            sql(RuleSpec::new(FormatRule::accepts("^[a-z]+|[0-9]+$"), ["code"])),
            "code IS NOT NULL AND code ~ '^(?:^[a-z]+|[0-9]+$)$'"
        );
        assert_eq!(
            sql(RuleSpec::new(FormatRule::rejects("--").case_insensitive(), ["slug"])
                .allow_null(true)),
            "slug !~* '--' OR slug IS NULL"
        );
    }

    #[test]
    fn compiles_conditional_requirement() {
        assert_eq!(
            sql(RuleSpec::new(
                ConditionalRule::when(Condition::equals("state", "on_loan")),
                ["due_date"]
            )),
            "NOT COALESCE(state = 'on_loan', FALSE) OR due_date IS NOT NULL"
        );
    }

    #[test]
    fn allow_blank_is_independent_of_allow_null() {
        assert_eq!(
            sql(RuleSpec::new(LengthRule::at_least(3), ["code"]).allow_blank(true)),
            "code IS NOT NULL AND (char_length(code) >= 3 OR code = '')"
        );
    }

    #[test]
    fn format_requires_regex_capability() {
        let rule = RuleSpec::new(FormatRule::accepts("[a-z]+"), ["slug"])
            .build()
            .expect("valid rule");
        let mut dialect = Dialect::postgres();
        dialect.regex_match = false;
        let err = compile_predicate(&rule, &dialect).expect_err("no regex support");
        assert_eq!(err.kind, "format");
    }

    #[test]
    fn fingerprint_is_stable() {
        let rule = RuleSpec::new(RangeRule::between(1, 12), ["published_month"])
            .build()
            .expect("valid rule");
        let first = compile(&rule, &Dialect::postgres()).expect("compiles");
        let second = compile(&rule, &Dialect::postgres()).expect("compiles");
        assert_eq!(first.sql, second.sql);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 16);
    }
}
