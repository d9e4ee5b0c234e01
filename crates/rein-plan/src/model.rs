use rein_core::{RuleSpec, TableRef};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Root rules document (`rules.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RulesDocument {
    /// Contract version, currently `0.1`.
    pub rules_version: String,
    /// Constraint name prefix; defaults to `rein`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub tables: Vec<TableRules>,
}

/// Rules declared for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TableRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

impl TableRules {
    pub fn table_ref(&self) -> TableRef {
        TableRef {
            schema: self.schema.clone(),
            name: self.table.clone(),
        }
    }
}
