use std::fmt;

use sha2::{Digest, Sha256};

use crate::dialect::{Dialect, POSTGRES_MAX_IDENTIFIER_LEN};
use crate::error::InvalidRuleError;
use crate::rule::Rule;

/// Prefix shared by every constraint this system manages.
pub const DEFAULT_PREFIX: &str = "rein";

const HASH_LEN: usize = 8;
const LONGEST_CODE: usize = 4;

/// Deterministic constraint name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConstraintName(String);

impl ConstraintName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConstraintName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConstraintName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives `{prefix}_{table}_{columns}[_{label}]_{code}` constraint names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namer {
    prefix: String,
    max_len: usize,
}

impl Namer {
    /// Create a namer for the given prefix and dialect identifier limit.
    ///
    /// The prefix is normalized like every other name segment and must leave
    /// room for a truncated name.
    pub fn new(prefix: &str, dialect: &Dialect) -> Result<Self, InvalidRuleError> {
        let prefix = normalize_segment(prefix);
        if prefix.is_empty() {
            return Err(InvalidRuleError::new("prefix", "must not be empty"));
        }

        // prefix + "_" + at least one char + "_" + code + "_" + hash
        let minimum = prefix.len() + 1 + 1 + 1 + LONGEST_CODE + 1 + HASH_LEN;
        if dialect.max_identifier_len < minimum {
            return Err(InvalidRuleError::new(
                "prefix",
                format!(
                    "prefix {prefix} needs identifiers of at least {minimum} bytes, dialect allows {}",
                    dialect.max_identifier_len
                ),
            ));
        }

        Ok(Self {
            prefix,
            max_len: dialect.max_identifier_len,
        })
    }

    /// Namer with [`DEFAULT_PREFIX`] for the given dialect.
    pub fn with_default_prefix(dialect: &Dialect) -> Result<Self, InvalidRuleError> {
        Self::new(DEFAULT_PREFIX, dialect)
    }

    /// Namer with [`DEFAULT_PREFIX`] and PostgreSQL's identifier limit.
    pub fn postgres() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            max_len: POSTGRES_MAX_IDENTIFIER_LEN,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a constraint name belongs to this system.
    pub fn owns(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix.as_str())
            .is_some_and(|rest| rest.starts_with('_'))
    }

    /// Name for a rule on `table` (unqualified table name).
    pub fn name_for(&self, table: &str, rule: &Rule) -> ConstraintName {
        let code = rule.kind().code();

        let mut raw_segments = vec![table.to_string()];
        raw_segments.extend(rule.target().iter().cloned());
        if let Some(label) = rule.label() {
            raw_segments.push(label.to_string());
        }

        let middle = raw_segments
            .iter()
            .map(|segment| normalize_segment(segment))
            .collect::<Vec<_>>()
            .join("_");
        let full = format!("{}_{middle}_{code}", self.prefix);
        if full.len() <= self.max_len {
            return ConstraintName(full);
        }

        let untruncated = format!("{}_{}_{code}", self.prefix, raw_segments.join("_"));
        let hash = hex::encode(Sha256::digest(untruncated.as_bytes()));
        let hash = &hash[..HASH_LEN];

        let budget = self
            .max_len
            .saturating_sub(self.prefix.len() + code.len() + HASH_LEN + 3);
        let mut len = budget.min(middle.len());
        while len > 0 && !middle.is_char_boundary(len) {
            len -= 1;
        }
        let truncated = middle[..len].trim_end_matches('_');

        ConstraintName(format!("{}_{truncated}_{code}_{hash}", self.prefix))
    }
}

/// Lower-case ASCII; anything outside `[a-z0-9_]` becomes `_`.
fn normalize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|ch| {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}
