use std::collections::HashSet;

use jsonschema::JSONSchema;
use rein_core::{Dialect, Namer, RULES_VERSION, Rule, TableRef};
use serde_json::Value;

use crate::errors::{IssueSeverity, PlanError, ValidationIssue, ValidationReport};
use crate::model::RulesDocument;
use crate::schema::rules_json_schema;

/// Rules for one table, every rule already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTable {
    pub table: TableRef,
    pub rules: Vec<Rule>,
}

/// Validated rules document with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedDocument {
    pub prefix: Option<String>,
    pub tables: Vec<ValidatedTable>,
    pub warnings: Vec<ValidationIssue>,
}

/// Validate a rules JSON document against a rules JSON Schema.
pub fn validate_rules_json(
    rules_json: &Value,
    rules_schema: &Value,
) -> Result<ValidationReport, PlanError> {
    let compiled =
        JSONSchema::compile(rules_schema).map_err(|err| PlanError::Schema(err.to_string()))?;

    let mut report = ValidationReport::default();

    if let Err(errors) = compiled.validate(rules_json) {
        for error in errors {
            let path = normalized_json_pointer(&error.instance_path.to_string());
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "schema_violation",
                path,
                error.to_string(),
                None,
            ));
        }
    }

    Ok(report)
}

/// Check a parsed document and build validated rules for every table.
///
/// Rules that fail the rule model are reported at
/// `/tables/{t}/rules/{r}/{field}` and left out of the result. The prefix
/// is checked against the identifier limit of `dialect`.
pub fn validate_document(
    doc: &RulesDocument,
    dialect: &Dialect,
) -> (Vec<ValidatedTable>, ValidationReport) {
    let mut report = ValidationReport::default();

    if doc.rules_version != RULES_VERSION {
        report.push_error(ValidationIssue::new(
            IssueSeverity::Error,
            "unsupported_rules_version",
            "/rules_version",
            format!("rules_version {} is not supported", doc.rules_version),
            Some(format!("set rules_version to {RULES_VERSION}")),
        ));
    }

    if let Some(prefix) = &doc.prefix {
        if let Err(err) = Namer::new(prefix, dialect) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "invalid_prefix",
                "/prefix",
                err.reason,
                Some("use a short prefix of ASCII letters, digits or '_'".to_string()),
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut tables = Vec::with_capacity(doc.tables.len());

    for (table_index, entry) in doc.tables.iter().enumerate() {
        let base_path = format!("/tables/{table_index}");

        if entry.table.trim().is_empty() {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "table_empty",
                format!("{base_path}/table"),
                "table name must not be empty",
                None,
            ));
            continue;
        }

        let table = entry.table_ref();
        if !seen.insert(table.clone()) {
            report.push_error(ValidationIssue::new(
                IssueSeverity::Error,
                "duplicate_table",
                format!("{base_path}/table"),
                format!("table {table} is declared more than once"),
                Some("merge the rules into a single table entry".to_string()),
            ));
            continue;
        }

        if entry.rules.is_empty() {
            report.push_warning(ValidationIssue::new(
                IssueSeverity::Warning,
                "rules_empty",
                format!("{base_path}/rules"),
                format!("table {table} declares no rules"),
                Some("every rein-owned constraint on this table will be dropped".to_string()),
            ));
        }

        let mut rules = Vec::with_capacity(entry.rules.len());
        for (rule_index, spec) in entry.rules.iter().enumerate() {
            match spec.clone().build() {
                Ok(rule) => rules.push(rule),
                Err(err) => report.push_error(ValidationIssue::new(
                    IssueSeverity::Error,
                    "invalid_rule",
                    format!("{base_path}/rules/{rule_index}/{}", err.field),
                    err.reason,
                    None,
                )),
            }
        }

        tables.push(ValidatedTable { table, rules });
    }

    (tables, report)
}

/// Validate the document end-to-end for PostgreSQL, returning structured
/// issues on failure.
pub fn load_rules_document(rules_json: &Value) -> Result<ValidatedDocument, ValidationReport> {
    load_rules_document_for(rules_json, &Dialect::postgres())
}

/// Validate the document end-to-end for `dialect`.
pub fn load_rules_document_for(
    rules_json: &Value,
    dialect: &Dialect,
) -> Result<ValidatedDocument, ValidationReport> {
    let schema = match serde_json::to_value(rules_json_schema()) {
        Ok(schema) => schema,
        Err(err) => return Err(single_error("schema_validation_error", err.to_string())),
    };

    let structural = match validate_rules_json(rules_json, &schema) {
        Ok(report) => report,
        Err(err) => return Err(single_error("schema_validation_error", err.to_string())),
    };

    if !structural.is_ok() {
        return Err(structural);
    }

    let doc: RulesDocument = match serde_json::from_value(rules_json.clone()) {
        Ok(doc) => doc,
        Err(err) => return Err(single_error("invalid_rules_json", err.to_string())),
    };

    let (tables, report) = validate_document(&doc, dialect);
    if !report.is_ok() {
        return Err(report);
    }

    Ok(ValidatedDocument {
        prefix: doc.prefix,
        tables,
        warnings: report.warnings,
    })
}

fn single_error(code: &str, message: String) -> ValidationReport {
    let mut report = ValidationReport::default();
    report.push_error(ValidationIssue::new(
        IssueSeverity::Error,
        code,
        "/",
        message,
        None,
    ));
    report
}

fn normalized_json_pointer(pointer: &str) -> String {
    if pointer.is_empty() {
        "/".to_string()
    } else {
        pointer.to_string()
    }
}
