use async_trait::async_trait;
use rein_core::TableRef;
use rein_plan::{ConstraintHost, HostError, MigrationPlan, PresentConstraints};
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::options::ApplyOptions;

mod mapper;
mod queries;

/// Constraint host backed by a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PostgresHost {
    pool: PgPool,
    opts: ApplyOptions,
}

impl PostgresHost {
    /// Create a new host using a pre-configured pool.
    pub fn new(pool: PgPool) -> Self {
        Self::with_options(pool, ApplyOptions::default())
    }

    pub fn with_options(pool: PgPool, opts: ApplyOptions) -> Self {
        Self { pool, opts }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ConstraintHost for PostgresHost {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn present_constraints(
        &self,
        table: &TableRef,
    ) -> Result<PresentConstraints, HostError> {
        list_present_constraints(&self.pool, table).await
    }

    async fn apply(&self, plan: &MigrationPlan) -> Result<(), HostError> {
        apply_plan(&self.pool, plan, &self.opts).await
    }
}

/// CHECK constraints on `table` with the fingerprints recorded in their comments.
pub async fn list_present_constraints(
    pool: &PgPool,
    table: &TableRef,
) -> Result<PresentConstraints, HostError> {
    let raw = queries::list_check_constraints(pool, table).await?;
    for check in &raw {
        debug!(
            table = %table,
            constraint = %check.name,
            definition = %check.expression,
            "found check constraint"
        );
    }
    Ok(mapper::map_check_constraints(raw))
}

/// Execute every statement of a plan inside one transaction.
async fn apply_plan(
    pool: &PgPool,
    plan: &MigrationPlan,
    opts: &ApplyOptions,
) -> Result<(), HostError> {
    if opts.dry_run {
        for statement in plan.statements() {
            info!(table = %plan.table, "dry run: {statement}");
        }
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|err| HostError::Db(err.to_string()))?;

    if let Some(statement) = opts.lock_timeout_statement() {
        (&mut *tx)
            .execute(sqlx::raw_sql(&statement))
            .await
            .map_err(|err| HostError::Db(err.to_string()))?;
    }

    for action in &plan.actions {
        debug!(
            table = %plan.table,
            action = action.action.as_str(),
            constraint = %action.name,
            "executing"
        );
        (&mut *tx)
            .execute(sqlx::raw_sql(&action.statement))
            .await
            .map_err(|err| {
                HostError::Db(format!("{} {}: {err}", action.action.as_str(), action.name))
            })?;
    }

    tx.commit()
        .await
        .map_err(|err| HostError::Db(err.to_string()))?;

    info!(table = %plan.table, statements = plan.actions.len(), "applied migration plan");
    Ok(())
}
