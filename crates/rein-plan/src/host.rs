use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rein_core::{Rule, TableRef};
use thiserror::Error;
use tracing::debug;

use crate::errors::Result;
use crate::planner::{Action, MigrationPlan, Planner};
use crate::present::PresentConstraints;

/// Errors raised by a constraint host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("database error: {0}")]
    Db(String),
    #[error("host error: {0}")]
    Other(String),
}

/// Storage engine that holds CHECK constraints.
#[async_trait]
pub trait ConstraintHost: Send + Sync {
    /// Engine identifier (e.g. `postgres`).
    fn engine(&self) -> &'static str;

    /// CHECK constraints currently defined on `table`.
    async fn present_constraints(
        &self,
        table: &TableRef,
    ) -> std::result::Result<PresentConstraints, HostError>;

    /// Execute every statement of `plan`, in order.
    async fn apply(&self, plan: &MigrationPlan) -> std::result::Result<(), HostError>;
}

/// Read the table state, plan against it and apply the result.
pub async fn migrate_table<H>(
    host: &H,
    planner: &Planner,
    table: &TableRef,
    rules: &[Rule],
) -> Result<MigrationPlan>
where
    H: ConstraintHost + ?Sized,
{
    let present = host.present_constraints(table).await?;
    let plan = planner.plan(table, rules, &present)?;
    if !plan.is_empty() {
        host.apply(&plan).await?;
        debug!(
            engine = host.engine(),
            table = %table,
            statements = plan.actions.len(),
            "applied constraint migration"
        );
    }
    Ok(plan)
}

/// In-memory host that records executed statements.
///
/// Adds only take effect when the name is absent, mirroring the guarded
/// statements a real database executes.
#[derive(Debug, Default)]
pub struct RecordingHost {
    state: Mutex<RecordingState>,
}

#[derive(Debug, Default)]
struct RecordingState {
    tables: BTreeMap<TableRef, PresentConstraints>,
    statements: Vec<String>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a constraint that exists before any plan runs.
    pub fn with_constraint(
        self,
        table: &TableRef,
        name: impl Into<String>,
        fingerprint: Option<String>,
    ) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state
                .tables
                .entry(table.clone())
                .or_default()
                .insert(name, fingerprint);
        }
        self
    }

    /// Every statement executed so far.
    pub fn statements(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.statements.clone())
            .unwrap_or_default()
    }

    /// Constraints currently recorded for `table`.
    pub fn constraints(&self, table: &TableRef) -> PresentConstraints {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tables.get(table).cloned())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConstraintHost for RecordingHost {
    fn engine(&self) -> &'static str {
        "recording"
    }

    async fn present_constraints(
        &self,
        table: &TableRef,
    ) -> std::result::Result<PresentConstraints, HostError> {
        Ok(self.constraints(table))
    }

    async fn apply(&self, plan: &MigrationPlan) -> std::result::Result<(), HostError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| HostError::Other("recording host state poisoned".to_string()))?;
        let RecordingState { tables, statements } = &mut *state;
        let present = tables.entry(plan.table.clone()).or_default();
        for action in &plan.actions {
            match action.action {
                Action::Add => {
                    if !present.contains(&action.name) {
                        present.insert(action.name.clone(), action.fingerprint.clone());
                    }
                }
                Action::Drop => {
                    present.remove(&action.name);
                }
            }
            statements.push(action.statement.clone());
        }
        Ok(())
    }
}
