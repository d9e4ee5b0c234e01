use rein_core::{TableRef, quote_ident, quote_literal};

use crate::present::fingerprint_comment;

/// Guarded `ADD CONSTRAINT` statement.
///
/// The `DO` block looks the name up in `pg_catalog.pg_constraint` for the
/// table and only adds the constraint (and its fingerprint comment) when it
/// is absent, so replaying the statement is a no-op.
pub fn guarded_add(
    table: &TableRef,
    name: &str,
    predicate: &str,
    fingerprint: &str,
    validate: bool,
) -> String {
    let ident = quote_ident(name);
    let not_valid = if validate { "" } else { " NOT VALID" };
    let body = format!(
        "BEGIN\n  IF NOT EXISTS (\n    SELECT 1 FROM pg_catalog.pg_constraint\n    WHERE conname = {conname} AND conrelid = {regclass}::regclass\n  ) THEN\n    ALTER TABLE {table} ADD CONSTRAINT {ident} CHECK ({predicate}){not_valid};\n    COMMENT ON CONSTRAINT {ident} ON {table} IS {comment};\n  END IF;\nEND",
        conname = quote_literal(name),
        regclass = quote_literal(&table.to_string()),
        comment = quote_literal(&fingerprint_comment(fingerprint)),
    );
    let tag = dollar_tag(&body);
    format!("DO {tag}\n{body}\n{tag};")
}

/// `DROP CONSTRAINT IF EXISTS` statement.
pub fn guarded_drop(table: &TableRef, name: &str) -> String {
    format!(
        "ALTER TABLE {table} DROP CONSTRAINT IF EXISTS {};",
        quote_ident(name)
    )
}

/// Dollar-quote tag that does not occur in `body`.
fn dollar_tag(body: &str) -> String {
    let mut tag = "$rein$".to_string();
    let mut counter = 0usize;
    while body.contains(&tag) {
        counter += 1;
        tag = format!("$rein{counter}$");
    }
    tag
}
