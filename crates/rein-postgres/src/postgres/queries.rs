use rein_core::TableRef;
use rein_plan::HostError;
use sqlx::PgPool;

pub struct RawCheckConstraint {
    pub name: String,
    pub expression: String,
    pub comment: Option<String>,
}

pub async fn list_check_constraints(
    pool: &PgPool,
    table: &TableRef,
) -> Result<Vec<RawCheckConstraint>, HostError> {
    let rows = sqlx::query_as::<_, (String, String, Option<String>)>(
        r#"
        select
          con.conname::text,
          pg_get_constraintdef(con.oid, true),
          pg_catalog.obj_description(con.oid, 'pg_constraint')
        from pg_constraint con
        where con.conrelid = $1::regclass
          and con.contype = 'c'
        order by con.conname
        "#,
    )
    .bind(table.to_string())
    .fetch_all(pool)
    .await
    .map_err(|err| HostError::Db(err.to_string()))?;

    Ok(rows
        .into_iter()
        .map(|(name, expression, comment)| RawCheckConstraint {
            name,
            expression,
            comment,
        })
        .collect())
}
