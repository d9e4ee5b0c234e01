use rein_core::NameCollisionError;
use thiserror::Error;

use crate::host::HostError;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
    Warning,
}

/// Structured validation issue with location and hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    pub code: String,
    pub path: String,
    pub message: String,
    pub hint: Option<String>,
}

impl ValidationIssue {
    /// Create a new validation issue.
    pub fn new(
        severity: IssueSeverity,
        code: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
        hint: Option<String>,
    ) -> Self {
        Self {
            severity,
            code: code.into(),
            path: path.into(),
            message: message.into(),
            hint,
        }
    }
}

/// Aggregated validation report with errors and warnings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns true when there are no errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error issue.
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning issue.
    pub fn push_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            IssueSeverity::Error => "error",
            IssueSeverity::Warning => "warning",
        };
        write!(f, "{severity} {} {}: {}", self.code, self.path, self.message)
    }
}

/// Planning and document errors that are not structural issues.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("schema error: {0}")]
    Schema(String),
    #[error(transparent)]
    NameCollision(#[from] NameCollisionError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result type for planning operations.
pub type Result<T> = std::result::Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issues_render_severity_code_and_path() {
        let issue = ValidationIssue::new(
            IssueSeverity::Warning,
            "unknown_table",
            "/tables/0/table",
            "table is not declared",
            None,
        );
        assert_eq!(
            issue.to_string(),
            "warning unknown_table /tables/0/table: table is not declared"
        );

        let mut report = ValidationReport::default();
        report.push_warning(issue);
        assert!(report.is_ok());
    }

    #[test]
    fn collisions_surface_as_plan_errors() {
        let collision = NameCollisionError {
            name: "rein_books_code_len".to_string(),
            first: "length at most 10 on code".to_string(),
            second: "length at most 20 on code".to_string(),
        };
        let expected = collision.to_string();
        let err = PlanError::from(collision);
        assert!(matches!(err, PlanError::NameCollision(_)));
        assert_eq!(err.to_string(), expected);
    }
}
