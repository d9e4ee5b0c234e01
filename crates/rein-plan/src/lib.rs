//! Rules documents, migration planning and constraint hosts for rein.

pub mod errors;
pub mod host;
pub mod model;
pub mod planner;
pub mod present;
pub mod render;
pub mod schema;
pub mod validate;

pub use errors::{IssueSeverity, PlanError, Result, ValidationIssue, ValidationReport};
pub use host::{ConstraintHost, HostError, RecordingHost, migrate_table};
pub use model::{RulesDocument, TableRules};
pub use planner::{Action, MigrationPlan, PlannedAction, Planner, RejectedRule};
pub use present::{
    FINGERPRINT_COMMENT_PREFIX, PresentConstraints, fingerprint_comment,
    parse_fingerprint_comment,
};
pub use render::{guarded_add, guarded_drop};
pub use schema::rules_json_schema;
pub use validate::{
    ValidatedDocument, ValidatedTable, load_rules_document, load_rules_document_for,
    validate_document, validate_rules_json,
};
