use std::cmp::Ordering;
use std::collections::BTreeSet;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::InvalidRuleError;
use crate::value::{Literal, Numeric};

/// Comparison operators usable in conditional triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    /// Whether an ordering between two operands satisfies the operator.
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// Numeric bounds on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RangeRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Numeric>,
    #[serde(default = "default_true")]
    pub min_inclusive: bool,
    #[serde(default = "default_true")]
    pub max_inclusive: bool,
}

impl RangeRule {
    /// Closed interval `[min, max]`.
    pub fn between(min: impl Into<Numeric>, max: impl Into<Numeric>) -> Self {
        Self {
            min: Some(min.into()),
            max: Some(max.into()),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn at_least(min: impl Into<Numeric>) -> Self {
        Self {
            min: Some(min.into()),
            max: None,
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn greater_than(min: impl Into<Numeric>) -> Self {
        Self {
            min_inclusive: false,
            ..Self::at_least(min)
        }
    }

    pub fn at_most(max: impl Into<Numeric>) -> Self {
        Self {
            min: None,
            max: Some(max.into()),
            min_inclusive: true,
            max_inclusive: true,
        }
    }

    pub fn less_than(max: impl Into<Numeric>) -> Self {
        Self {
            max_inclusive: false,
            ..Self::at_most(max)
        }
    }

    pub fn inclusive(mut self, min_inclusive: bool, max_inclusive: bool) -> Self {
        self.min_inclusive = min_inclusive;
        self.max_inclusive = max_inclusive;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Parity {
    Even,
    Odd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParityRule {
    pub parity: Parity,
}

/// Whether the constrained column holds text (where blank is distinct from NULL).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueClass {
    #[default]
    Text,
    NonText,
}

/// Value must be present: not NULL, and not blank when the column is text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PresenceRule {
    /// Defaults to `text`, which also rejects `''`. Columns of any other
    /// type must set `non_text`, otherwise PostgreSQL rejects the blank
    /// comparison when the constraint is added.
    #[serde(default)]
    pub column_type: ValueClass,
}

/// Character-length bounds on a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LengthRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
}

impl LengthRule {
    pub fn between(min_length: i64, max_length: i64) -> Self {
        Self {
            min_length: Some(min_length),
            max_length: Some(max_length),
        }
    }

    pub fn at_least(min_length: i64) -> Self {
        Self {
            min_length: Some(min_length),
            max_length: None,
        }
    }

    pub fn at_most(max_length: i64) -> Self {
        Self {
            min_length: None,
            max_length: Some(max_length),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InclusionRule {
    pub values: Vec<Literal>,
}

impl InclusionRule {
    pub fn of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Literal>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FormatMode {
    /// The whole value must match the pattern.
    #[default]
    Accepts,
    /// No part of the value may match the pattern.
    Rejects,
}

/// Regular-expression format on a text column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormatRule {
    pub pattern: String,
    #[serde(default)]
    pub mode: FormatMode,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl FormatRule {
    pub fn accepts(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: FormatMode::Accepts,
            case_insensitive: false,
        }
    }

    pub fn rejects(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: FormatMode::Rejects,
            case_insensitive: false,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

/// One predicate of a conditional trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Condition {
    Compare {
        column: String,
        operator: CompareOp,
        value: Literal,
    },
    In {
        column: String,
        values: Vec<Literal>,
    },
    IsNull {
        column: String,
    },
    IsNotNull {
        column: String,
    },
}

impl Condition {
    pub fn equals(column: impl Into<String>, value: impl Into<Literal>) -> Self {
        Condition::Compare {
            column: column.into(),
            operator: CompareOp::Eq,
            value: value.into(),
        }
    }

    pub fn compare(
        column: impl Into<String>,
        operator: CompareOp,
        value: impl Into<Literal>,
    ) -> Self {
        Condition::Compare {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            Condition::Compare { column, .. }
            | Condition::In { column, .. }
            | Condition::IsNull { column }
            | Condition::IsNotNull { column } => column,
        }
    }
}

/// Target columns become mandatory whenever every trigger condition holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalRule {
    pub when: Vec<Condition>,
    /// Also reject the empty string in the required columns.
    #[serde(default)]
    pub reject_blank: bool,
}

impl ConditionalRule {
    pub fn when(condition: Condition) -> Self {
        Self {
            when: vec![condition],
            reject_blank: false,
        }
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.when.push(condition);
        self
    }

    pub fn reject_blank(mut self) -> Self {
        self.reject_blank = true;
        self
    }
}

/// Rule kinds with their typed parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleKind {
    Range(RangeRule),
    Parity(ParityRule),
    Presence(PresenceRule),
    Length(LengthRule),
    Inclusion(InclusionRule),
    Format(FormatRule),
    Conditional(ConditionalRule),
}

impl RuleKind {
    pub fn even() -> Self {
        RuleKind::Parity(ParityRule {
            parity: Parity::Even,
        })
    }

    pub fn odd() -> Self {
        RuleKind::Parity(ParityRule {
            parity: Parity::Odd,
        })
    }

    /// Presence on a text column: rejects NULL and `''`.
    ///
    /// Use [`RuleKind::non_text_presence`] for numeric, date or boolean
    /// columns.
    pub fn presence() -> Self {
        RuleKind::Presence(PresenceRule::default())
    }

    /// Presence on a column that is not text: rejects NULL only.
    pub fn non_text_presence() -> Self {
        RuleKind::Presence(PresenceRule {
            column_type: ValueClass::NonText,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Range(_) => "range",
            RuleKind::Parity(_) => "parity",
            RuleKind::Presence(_) => "presence",
            RuleKind::Length(_) => "length",
            RuleKind::Inclusion(_) => "inclusion",
            RuleKind::Format(_) => "format",
            RuleKind::Conditional(_) => "conditional",
        }
    }

    /// Short code used as the constraint name suffix.
    pub fn code(&self) -> &'static str {
        match self {
            RuleKind::Range(_) => "rng",
            RuleKind::Parity(_) => "par",
            RuleKind::Presence(_) => "pres",
            RuleKind::Length(_) => "len",
            RuleKind::Inclusion(_) => "incl",
            RuleKind::Format(_) => "fmt",
            RuleKind::Conditional(_) => "cond",
        }
    }

    fn is_text_valued(&self) -> bool {
        match self {
            RuleKind::Length(_) | RuleKind::Format(_) => true,
            RuleKind::Inclusion(inclusion) => inclusion
                .values
                .iter()
                .all(|value| matches!(value, Literal::Text(_))),
            _ => false,
        }
    }
}

impl From<RangeRule> for RuleKind {
    fn from(value: RangeRule) -> Self {
        RuleKind::Range(value)
    }
}

impl From<LengthRule> for RuleKind {
    fn from(value: LengthRule) -> Self {
        RuleKind::Length(value)
    }
}

impl From<InclusionRule> for RuleKind {
    fn from(value: InclusionRule) -> Self {
        RuleKind::Inclusion(value)
    }
}

impl From<FormatRule> for RuleKind {
    fn from(value: FormatRule) -> Self {
        RuleKind::Format(value)
    }
}

impl From<ConditionalRule> for RuleKind {
    fn from(value: ConditionalRule) -> Self {
        RuleKind::Conditional(value)
    }
}

/// Unvalidated rule description, as written by callers or read from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RuleSpec {
    /// Columns the predicate applies to, in order.
    pub target: Vec<String>,
    #[serde(flatten)]
    pub kind: RuleKind,
    /// An all-NULL target satisfies the rule.
    #[serde(default)]
    pub allow_null: bool,
    /// The empty string satisfies a text-valued rule.
    #[serde(default)]
    pub allow_blank: bool,
    /// Discriminator inserted into the constraint name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// When false the constraint is added `NOT VALID`.
    #[serde(default = "default_true")]
    pub validate: bool,
}

impl RuleSpec {
    pub fn new<I, S>(kind: impl Into<RuleKind>, target: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target: target.into_iter().map(Into::into).collect(),
            kind: kind.into(),
            allow_null: false,
            allow_blank: false,
            label: None,
            validate: true,
        }
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn allow_blank(mut self, allow_blank: bool) -> Self {
        self.allow_blank = allow_blank;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn not_valid(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Validate the description and produce a [`Rule`].
    pub fn build(self) -> Result<Rule, InvalidRuleError> {
        Rule::try_from(self)
    }
}

/// A validated constraint intent.
///
/// Construction goes through [`RuleSpec::build`] (or deserialization), which
/// enforces the rule model invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleSpec", into = "RuleSpec")]
pub struct Rule {
    spec: RuleSpec,
}

impl Rule {
    pub fn kind(&self) -> &RuleKind {
        &self.spec.kind
    }

    pub fn target(&self) -> &[String] {
        &self.spec.target
    }

    pub fn allow_null(&self) -> bool {
        self.spec.allow_null
    }

    pub fn allow_blank(&self) -> bool {
        self.spec.allow_blank
    }

    pub fn label(&self) -> Option<&str> {
        self.spec.label.as_deref()
    }

    pub fn validate(&self) -> bool {
        self.spec.validate
    }

    pub fn spec(&self) -> &RuleSpec {
        &self.spec
    }

    /// Short human-readable description, e.g. `range(published_month)`.
    pub fn describe(&self) -> String {
        let columns = self.spec.target.join(", ");
        match &self.spec.label {
            Some(label) => format!("{}({columns})[{label}]", self.spec.kind.name()),
            None => format!("{}({columns})", self.spec.kind.name()),
        }
    }
}

impl TryFrom<RuleSpec> for Rule {
    type Error = InvalidRuleError;

    fn try_from(spec: RuleSpec) -> Result<Self, Self::Error> {
        validate_spec(&spec)?;
        Ok(Self { spec })
    }
}

impl From<Rule> for RuleSpec {
    fn from(rule: Rule) -> Self {
        rule.spec
    }
}

fn default_true() -> bool {
    true
}

fn validate_spec(spec: &RuleSpec) -> Result<(), InvalidRuleError> {
    validate_target(&spec.target)?;

    if let Some(label) = &spec.label {
        if label.is_empty()
            || !label
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return Err(InvalidRuleError::new(
                "label",
                "labels must be non-empty and contain only ASCII letters, digits or '_'",
            ));
        }
    }

    if spec.allow_blank && !spec.kind.is_text_valued() {
        return Err(InvalidRuleError::new(
            "allow_blank",
            format!(
                "allow_blank only applies to text length, format and inclusion rules, not {}",
                spec.kind.name()
            ),
        ));
    }

    match &spec.kind {
        RuleKind::Range(range) => validate_range(range),
        RuleKind::Parity(_) => Ok(()),
        RuleKind::Presence(presence) => {
            if presence.column_type == ValueClass::NonText && spec.allow_null {
                return Err(InvalidRuleError::new(
                    "allow_null",
                    "a presence rule on a non-text column cannot allow NULL",
                ));
            }
            Ok(())
        }
        RuleKind::Length(length) => validate_length(length),
        RuleKind::Inclusion(inclusion) => validate_values("values", &inclusion.values),
        RuleKind::Format(format) => validate_pattern(&format.pattern),
        RuleKind::Conditional(conditional) => {
            if spec.allow_null {
                return Err(InvalidRuleError::new(
                    "allow_null",
                    "a conditional requirement cannot allow NULL in its required columns",
                ));
            }
            validate_conditional(conditional, &spec.target)
        }
    }
}

fn validate_target(target: &[String]) -> Result<(), InvalidRuleError> {
    if target.is_empty() {
        return Err(InvalidRuleError::new(
            "target",
            "at least one column is required",
        ));
    }

    let mut seen = BTreeSet::new();
    for column in target {
        validate_identifier("target", column)?;
        if !seen.insert(column.as_str()) {
            return Err(InvalidRuleError::new(
                "target",
                format!("column {column} is listed more than once"),
            ));
        }
    }
    Ok(())
}

fn validate_identifier(field: &str, name: &str) -> Result<(), InvalidRuleError> {
    if name.is_empty() {
        return Err(InvalidRuleError::new(
            field,
            "column names must not be empty",
        ));
    }
    if name.contains('\0') {
        return Err(InvalidRuleError::new(
            field,
            format!("column name {name:?} contains a NUL byte"),
        ));
    }
    Ok(())
}

fn validate_range(range: &RangeRule) -> Result<(), InvalidRuleError> {
    if range.min.is_none() && range.max.is_none() {
        return Err(InvalidRuleError::new(
            "min",
            "a range needs at least one of min or max",
        ));
    }
    if let Some(min) = range.min {
        if !min.is_finite() {
            return Err(InvalidRuleError::new("min", "must be a finite number"));
        }
    }
    if let Some(max) = range.max {
        if !max.is_finite() {
            return Err(InvalidRuleError::new("max", "must be a finite number"));
        }
    }

    if let (Some(min), Some(max)) = (range.min, range.max) {
        match min.compare(max) {
            Some(Ordering::Greater) | None => {
                return Err(InvalidRuleError::new(
                    "min",
                    format!("min {min} is greater than max {max}"),
                ));
            }
            Some(Ordering::Equal) if !(range.min_inclusive && range.max_inclusive) => {
                return Err(InvalidRuleError::new(
                    "min",
                    format!("min equals max ({min}); both bounds must be inclusive"),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_length(length: &LengthRule) -> Result<(), InvalidRuleError> {
    if length.min_length.is_none() && length.max_length.is_none() {
        return Err(InvalidRuleError::new(
            "min_length",
            "a length rule needs at least one of min_length or max_length",
        ));
    }
    if let Some(min) = length.min_length {
        if min < 0 {
            return Err(InvalidRuleError::new(
                "min_length",
                format!("must not be negative, got {min}"),
            ));
        }
    }
    if let Some(max) = length.max_length {
        if max < 0 {
            return Err(InvalidRuleError::new(
                "max_length",
                format!("must not be negative, got {max}"),
            ));
        }
    }
    if let (Some(min), Some(max)) = (length.min_length, length.max_length) {
        if max < min {
            return Err(InvalidRuleError::new(
                "max_length",
                format!("max_length {max} is less than min_length {min}"),
            ));
        }
    }
    Ok(())
}

fn validate_values(field: &str, values: &[Literal]) -> Result<(), InvalidRuleError> {
    let Some(first) = values.first() else {
        return Err(InvalidRuleError::new(
            field,
            "at least one allowed value is required",
        ));
    };

    let expected = first.literal_type();
    for value in values {
        if !value.is_finite() {
            return Err(InvalidRuleError::new(field, "numbers must be finite"));
        }
        let found = value.literal_type();
        if found != expected {
            return Err(InvalidRuleError::new(
                field,
                format!(
                    "all values must share one type, found {} and {}",
                    expected.as_str(),
                    found.as_str()
                ),
            ));
        }
    }
    Ok(())
}

fn validate_pattern(pattern: &str) -> Result<(), InvalidRuleError> {
    if pattern.is_empty() {
        return Err(InvalidRuleError::new("pattern", "must not be empty"));
    }
    if pattern.contains('\0') {
        return Err(InvalidRuleError::new("pattern", "must not contain a NUL byte"));
    }
    Regex::new(pattern)
        .map_err(|err| InvalidRuleError::new("pattern", format!("invalid pattern: {err}")))?;
    if let Some(construct) = postgres_incompatibility(pattern) {
        return Err(InvalidRuleError::new(
            "pattern",
            format!("{construct} not supported by PostgreSQL regular expressions"),
        ));
    }
    Ok(())
}

/// First construct PostgreSQL's ARE engine rejects or reads differently.
///
/// Runs after the pattern compiled with `regex`, so the syntax is known to
/// be well formed.
fn postgres_incompatibility(pattern: &str) -> Option<&'static str> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut in_class = false;
    let mut class_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();

        if ch == '\\' {
            match next {
                Some('p' | 'P') => return Some("unicode property classes (\\p, \\P) are"),
                Some('z') => return Some("\\z is"),
                Some('b' | 'B') => return Some("word boundaries (\\b, \\B) are"),
                Some('x' | 'u' | 'U') if chars.get(i + 2) == Some(&'{') => {
                    return Some("braced escapes (\\x{..}, \\u{..}) are");
                }
                _ => {}
            }
            i += 2;
            continue;
        }

        if in_class {
            match ch {
                ']' if i > class_start => in_class = false,
                '[' if next == Some(':') => {
                    // POSIX class such as [:alpha:]
                    let rest: String = chars[i + 2..].iter().collect();
                    match rest.find(":]") {
                        Some(end) => {
                            i += 2 + rest[..end].chars().count() + 2;
                            continue;
                        }
                        None => return Some("unterminated character classes are"),
                    }
                }
                '[' => return Some("nested character classes are"),
                '&' | '-' | '~' if next == Some(ch) => {
                    return Some("character class set operations (&&, --, ~~) are");
                }
                _ => {}
            }
            i += 1;
            continue;
        }

        match ch {
            '[' => {
                in_class = true;
                class_start = if next == Some('^') { i + 2 } else { i + 1 };
            }
            '(' if next == Some('?') => match chars.get(i + 2) {
                Some(':' | '=' | '!') => {}
                Some('<') if matches!(chars.get(i + 3), Some('=' | '!')) => {}
                Some('P' | '<') => return Some("named groups are"),
                _ => return Some("inline flags are"),
            },
            _ => {}
        }
        i += 1;
    }

    None
}

fn validate_conditional(
    conditional: &ConditionalRule,
    target: &[String],
) -> Result<(), InvalidRuleError> {
    if conditional.when.is_empty() {
        return Err(InvalidRuleError::new(
            "when",
            "a conditional rule needs at least one trigger condition",
        ));
    }

    for condition in &conditional.when {
        let column = condition.column();
        validate_identifier("when", column)?;
        if target.iter().any(|required| required == column) {
            return Err(InvalidRuleError::new(
                "when",
                format!("column {column} cannot be both required and part of the trigger"),
            ));
        }
        match condition {
            Condition::Compare { value, .. } => {
                if !value.is_finite() {
                    return Err(InvalidRuleError::new("when", "numbers must be finite"));
                }
            }
            Condition::In { values, .. } => validate_values("when", values)?,
            Condition::IsNull { .. } | Condition::IsNotNull { .. } => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_error(pattern: &str) -> Option<InvalidRuleError> {
        RuleSpec::new(FormatRule::accepts(pattern), ["code"])
            .build()
            .err()
    }


    #[test]
    fn presence_column_type_defaults_to_text() {
        let text: RuleKind =
            serde_json::from_value(serde_json::json!({ "kind": "presence" })).expect("presence");
        assert_eq!(text, RuleKind::presence());

        let other: RuleKind = serde_json::from_value(
            serde_json::json!({ "kind": "presence", "column_type": "non_text" }),
        )
        .expect("non-text presence");
        assert_eq!(other, RuleKind::non_text_presence());
    }
    #[test]
    fn rejects_patterns_postgres_cannot_run() {
        for pattern in [
            r"\p{Lu}+",
            r"\PL",
            r"(?i)abc",
            r"a(?i:b)c",
            r"(?P<word>\w+)",
            r"abc\z",
            r"\bword\b",
            r"\x{41}+",
            r"[a-z&&[^aeiou]]+",
            r"[[a-z]]",
        ] {
            let err = pattern_error(pattern)
                .unwrap_or_else(|| panic!("{pattern} should be rejected"));
            assert_eq!(err.field, "pattern");
            assert!(err.reason.contains("PostgreSQL"), "{}", err.reason);
        }
    }

    #[test]
    fn accepts_patterns_both_engines_share() {
        for pattern in [
            r"[A-Za-z0-9][A-Za-z0-9 \t]*",
            r"[[:alpha:]]+[[:digit:]]*",
            r"[]a]+",
            r"[^]a-]+",
            r"\d{3}-\d{4}",
            r"(?:ab)+|c*?",
            r"^[a-z]+|[0-9]+$",
            r"\Aabc",
        ] {
            assert!(
                pattern_error(pattern).is_none(),
                "{pattern} rejected: {:?}",
                pattern_error(pattern)
            );
        }
    }

    #[test]
    fn rejects_empty_target() {
        let err = RuleSpec::new(RangeRule::between(1, 12), Vec::<String>::new())
            .build()
            .expect_err("empty target");
        assert_eq!(err.field, "target");
    }

    #[test]
    fn rejects_inverted_range() {
        let err = RuleSpec::new(RangeRule::between(12, 1), ["published_month"])
            .build()
            .expect_err("min > max");
        assert_eq!(err.field, "min");
    }

    #[test]
    fn equal_bounds_require_both_inclusive() {
        RuleSpec::new(RangeRule::between(5, 5), ["n"])
            .build()
            .expect("closed degenerate range is valid");

        let err = RuleSpec::new(RangeRule::between(5, 5).inclusive(true, false), ["n"])
            .build()
            .expect_err("half-open degenerate range");
        assert_eq!(err.field, "min");
    }

    #[test]
    fn rejects_negative_length() {
        let err = RuleSpec::new(LengthRule::at_least(-1), ["call_number"])
            .build()
            .expect_err("negative bound");
        assert_eq!(err.field, "min_length");

        let err = RuleSpec::new(LengthRule::between(10, 2), ["call_number"])
            .build()
            .expect_err("max < min");
        assert_eq!(err.field, "max_length");
    }

    #[test]
    fn rejects_empty_and_malformed_patterns() {
        let err = RuleSpec::new(FormatRule::accepts(""), ["title"])
            .build()
            .expect_err("empty pattern");
        assert_eq!(err.field, "pattern");

        let err = RuleSpec::new(FormatRule::accepts("[a-z"), ["title"])
            .build()
            .expect_err("unbalanced class");
        assert_eq!(err.field, "pattern");
    }

    #[test]
    fn rejects_mixed_inclusion_types() {
        let err = RuleSpec::new(
            InclusionRule {
                values: vec![Literal::from("a"), Literal::Integer(1)],
            },
            ["state"],
        )
        .build()
        .expect_err("mixed types");
        assert_eq!(err.field, "values");
    }

    #[test]
    fn allow_blank_only_on_text_rules() {
        let err = RuleSpec::new(RangeRule::at_least(0), ["n"])
            .allow_blank(true)
            .build()
            .expect_err("blank on range");
        assert_eq!(err.field, "allow_blank");

        RuleSpec::new(LengthRule::at_most(10), ["code"])
            .allow_blank(true)
            .build()
            .expect("blank on length");
    }

    #[test]
    fn conditional_rejects_overlapping_columns_and_allow_null() {
        let err = RuleSpec::new(
            ConditionalRule::when(Condition::equals("state", "on_loan")),
            ["state"],
        )
        .build()
        .expect_err("overlap");
        assert_eq!(err.field, "when");

        let err = RuleSpec::new(
            ConditionalRule::when(Condition::equals("state", "on_loan")),
            ["due_date"],
        )
        .allow_null(true)
        .build()
        .expect_err("allow_null");
        assert_eq!(err.field, "allow_null");
    }

    #[test]
    fn equality_is_structural() {
        let left = RuleSpec::new(RangeRule::between(1, 12), ["published_month"])
            .build()
            .expect("valid");
        let right = RuleSpec::new(RangeRule::between(1, 12), ["published_month"])
            .build()
            .expect("valid");
        assert_eq!(left, right);
        assert_ne!(left, right.clone().spec().clone().allow_null(true).build().expect("valid"));
    }

    #[test]
    fn deserializing_runs_validation() {
        let rule: Rule = serde_json::from_str(
            r#"{"target": ["published_month"], "kind": "range", "min": 1, "max": 12}"#,
        )
        .expect("valid rule json");
        assert_eq!(rule.kind(), &RuleKind::Range(RangeRule::between(1, 12)));
        assert!(!rule.allow_null());
        assert!(rule.validate());

        let err = serde_json::from_str::<Rule>(
            r#"{"target": ["published_month"], "kind": "range", "min": 13, "max": 12}"#,
        )
        .expect_err("invalid rule json");
        assert!(err.to_string().contains("greater than max"));
    }
}
