use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use rein_core::{
    ConstraintName, Dialect, NameCollisionError, Namer, Rule, TableRef, UnsupportedRuleError,
    compile,
};
use tracing::debug;

use crate::present::PresentConstraints;
use crate::render::{guarded_add, guarded_drop};

/// Kind of change a planned statement makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    Drop,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Drop => "drop",
        }
    }
}

/// One statement of a migration plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAction {
    pub action: Action,
    pub name: String,
    pub statement: String,
    /// Predicate fingerprint recorded by an add.
    pub fingerprint: Option<String>,
}

/// A desired rule the dialect cannot express.
///
/// Its name still counts as desired, so an existing constraint with that
/// name is never dropped on its behalf.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRule {
    pub name: String,
    pub rule: Rule,
    pub error: UnsupportedRuleError,
}

/// Ordered statements converging one table onto its desired rules.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    pub table: TableRef,
    /// Drops first, then adds; each group ordered by name.
    pub actions: Vec<PlannedAction>,
    pub rejected: Vec<RejectedRule>,
}

impl MigrationPlan {
    /// True when there is nothing to execute.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn adds(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions
            .iter()
            .filter(|action| action.action == Action::Add)
    }

    pub fn drops(&self) -> impl Iterator<Item = &PlannedAction> {
        self.actions
            .iter()
            .filter(|action| action.action == Action::Drop)
    }

    pub fn statements(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|action| action.statement.as_str())
    }

    /// Render the plan as a SQL script, rejected rules listed as comments.
    pub fn to_sql(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "-- {}: {} drop(s), {} add(s)",
            self.table,
            self.drops().count(),
            self.adds().count()
        );
        for rejected in &self.rejected {
            let _ = writeln!(out, "-- skipped {}: {}", rejected.name, rejected.error);
        }
        for statement in self.statements() {
            out.push_str(statement);
            out.push('\n');
        }
        out
    }
}

/// Computes migration plans for a dialect and naming scheme.
#[derive(Debug, Clone)]
pub struct Planner {
    dialect: Dialect,
    namer: Namer,
}

impl Planner {
    pub fn new(dialect: Dialect, namer: Namer) -> Self {
        Self { dialect, namer }
    }

    /// PostgreSQL dialect with the default prefix.
    pub fn postgres() -> Self {
        Self {
            dialect: Dialect::postgres(),
            namer: Namer::postgres(),
        }
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn namer(&self) -> &Namer {
        &self.namer
    }

    /// Plan the changes that make `present` match `rules` on `table`.
    ///
    /// Identical rules sharing a name are merged; different rules sharing a
    /// name fail the whole plan. Constraints whose names this planner does
    /// not own are never touched.
    pub fn plan(
        &self,
        table: &TableRef,
        rules: &[Rule],
        present: &PresentConstraints,
    ) -> Result<MigrationPlan, NameCollisionError> {
        let desired = self.desired(table, rules)?;

        let mut drops = Vec::new();
        let mut adds = Vec::new();
        let mut rejected = Vec::new();

        for (name, rule) in &desired {
            let compiled = match compile(rule, &self.dialect) {
                Ok(compiled) => compiled,
                Err(error) => {
                    debug!(constraint = %name, %error, "rule has no sql mapping");
                    rejected.push(RejectedRule {
                        name: name.to_string(),
                        rule: (*rule).clone(),
                        error,
                    });
                    continue;
                }
            };
            let fingerprint = compiled.fingerprint();

            match present.get(name.as_str()) {
                None => {}
                Some(Some(recorded)) if recorded != fingerprint => {
                    debug!(constraint = %name, recorded, current = %fingerprint, "predicate changed");
                    drops.push(self.drop_action(table, name.as_str()));
                }
                Some(_) => continue,
            }

            adds.push(PlannedAction {
                action: Action::Add,
                name: name.to_string(),
                statement: guarded_add(
                    table,
                    name.as_str(),
                    &compiled.sql,
                    &fingerprint,
                    rule.validate(),
                ),
                fingerprint: Some(fingerprint),
            });
        }

        let desired_names: BTreeSet<&str> = desired.keys().map(ConstraintName::as_str).collect();
        for name in present.names() {
            if self.namer.owns(name) && !desired_names.contains(name) {
                drops.push(self.drop_action(table, name));
            }
        }

        drops.sort_by(|left, right| left.name.cmp(&right.name));
        adds.sort_by(|left, right| left.name.cmp(&right.name));

        debug!(
            table = %table,
            drops = drops.len(),
            adds = adds.len(),
            rejected = rejected.len(),
            "planned constraint changes"
        );

        let mut actions = drops;
        actions.extend(adds);

        Ok(MigrationPlan {
            table: table.clone(),
            actions,
            rejected,
        })
    }

    fn desired<'a>(
        &self,
        table: &TableRef,
        rules: &'a [Rule],
    ) -> Result<BTreeMap<ConstraintName, &'a Rule>, NameCollisionError> {
        let mut desired: BTreeMap<ConstraintName, &Rule> = BTreeMap::new();
        for rule in rules {
            let name = self.namer.name_for(&table.name, rule);
            if let Some(existing) = desired.get(&name).copied() {
                if existing == rule {
                    debug!(constraint = %name, "merged duplicate rule");
                    continue;
                }
                return Err(NameCollisionError {
                    name: name.into_string(),
                    first: existing.describe(),
                    second: rule.describe(),
                });
            }
            desired.insert(name, rule);
        }
        Ok(desired)
    }

    fn drop_action(&self, table: &TableRef, name: &str) -> PlannedAction {
        PlannedAction {
            action: Action::Drop,
            name: name.to_string(),
            statement: guarded_drop(table, name),
            fingerprint: None,
        }
    }
}
