use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::model::RulesDocument;

/// Emit the JSON Schema for `rules.json`.
pub fn rules_json_schema() -> RootSchema {
    schema_for!(RulesDocument)
}
