use std::fs;
use std::path::Path;

use rein_core::Dialect;
use rein_plan::{
    IssueSeverity, PresentConstraints, Planner, load_rules_document, load_rules_document_for,
    rules_json_schema, validate_rules_json,
};
use serde_json::json;

fn load_json(path: &Path) -> serde_json::Value {
    let contents =
        fs::read_to_string(path).unwrap_or_else(|_| panic!("missing json at {}", path.display()));
    serde_json::from_str(&contents).expect("parse json")
}

fn library_document() -> serde_json::Value {
    load_json(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../../rules/library.rules.json"))
}

#[test]
fn library_rules_validate_against_schema() {
    let schema = serde_json::to_value(rules_json_schema()).expect("serialize schema");
    let structural = validate_rules_json(&library_document(), &schema).expect("compile schema");
    assert!(structural.errors.is_empty(), "structural errors: {:?}", structural.errors);

    let validated = load_rules_document(&library_document()).expect("document validates");
    assert!(validated.warnings.is_empty(), "unexpected warnings");
    assert_eq!(validated.tables.len(), 1);
    assert_eq!(validated.tables[0].rules.len(), 8);
}

#[test]
fn library_rules_plan_one_add_per_rule() {
    let validated = load_rules_document(&library_document()).expect("document validates");
    let table = &validated.tables[0];
    let plan = Planner::postgres()
        .plan(&table.table, &table.rules, &PresentConstraints::new())
        .expect("plan");
    assert_eq!(plan.adds().count(), 8);
    assert!(plan.rejected.is_empty());
}

#[test]
fn structural_errors_are_reported() {
    let doc = json!({ "rules_version": "0.1", "tables": [{ "rules": [] }] });
    let report = load_rules_document(&doc).expect_err("missing table name");
    assert!(!report.errors.is_empty());
    assert!(report.errors.iter().all(|issue| issue.code == "schema_violation"));
}

#[test]
fn invalid_rules_point_at_the_offending_field() {
    let doc = json!({
        "rules_version": "0.1",
        "tables": [{
            "table": "books",
            "rules": [
                { "kind": "presence", "target": ["isbn"] },
                { "kind": "range", "target": ["published_month"], "min": 12, "max": 1 }
            ]
        }]
    });
    let report = load_rules_document(&doc).expect_err("inverted range");
    assert_eq!(report.errors.len(), 1);
    let issue = &report.errors[0];
    assert_eq!(issue.code, "invalid_rule");
    assert!(
        issue.path.starts_with("/tables/0/rules/1/"),
        "unexpected path {}",
        issue.path
    );
}

#[test]
fn duplicate_tables_and_versions_are_rejected() {
    let doc = json!({
        "rules_version": "9.9",
        "tables": [
            { "table": "books", "rules": [{ "kind": "presence", "target": ["isbn"] }] },
            { "table": "books", "rules": [{ "kind": "presence", "target": ["title"] }] }
        ]
    });
    let report = load_rules_document(&doc).expect_err("invalid document");
    let codes: Vec<_> = report.errors.iter().map(|issue| issue.code.as_str()).collect();
    assert_eq!(codes, ["unsupported_rules_version", "duplicate_table"]);
    assert_eq!(report.errors[1].path, "/tables/1/table");
}

#[test]
fn empty_rule_lists_only_warn() {
    let doc = json!({
        "rules_version": "0.1",
        "prefix": "lib",
        "tables": [{ "schema": "app", "table": "books", "rules": [] }]
    });
    let validated = load_rules_document(&doc).expect("document validates");
    assert_eq!(validated.prefix.as_deref(), Some("lib"));
    assert_eq!(validated.warnings.len(), 1);
    assert_eq!(validated.warnings[0].severity, IssueSeverity::Warning);
    assert_eq!(validated.warnings[0].code, "rules_empty");
    assert_eq!(validated.tables[0].table.to_string(), "app.books");
}

#[test]
fn prefix_is_checked_against_the_target_identifier_limit() {
    let doc = json!({
        "rules_version": "0.1",
        "prefix": "library_checks",
        "tables": [{ "table": "books", "rules": [{ "kind": "presence", "target": ["isbn"] }] }]
    });
    load_rules_document(&doc).expect("prefix fits 63 bytes");

    let short = Dialect::postgres().with_max_identifier_len(24);
    let report = load_rules_document_for(&doc, &short).expect_err("prefix too long for 24 bytes");
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].code, "invalid_prefix");
    assert_eq!(report.errors[0].path, "/prefix");
}
