use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use tokio_postgres::NoTls;

use super::error::DbError;
use super::types::{DbOperation, DbValue};

const POOL_MAX_SIZE: usize = 16;

/// Connection pool over the projection database.
pub struct DbPool {
    pool: Pool,
}

impl DbPool {
    /// Create a pool from a postgres connection string and verify that a
    /// connection can actually be established.
    pub async fn new(database_url: &str) -> Result<Self, DbError> {
        let pg_config: tokio_postgres::Config = database_url
            .parse()
            .map_err(|e: tokio_postgres::Error| DbError::InvalidConnectionString(e.to_string()))?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(pg_config, NoTls, manager_config);
        let pool = Pool::builder(manager)
            .max_size(POOL_MAX_SIZE)
            .runtime(Runtime::Tokio1)
            .build()?;

        let client = pool.get().await?;
        client.simple_query("SELECT 1").await?;
        drop(client);

        Ok(Self { pool })
    }

    /// Apply the migrations under `migrations/` that have not run yet.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        super::migrations::run(&self.pool).await
    }

    /// Execute a single operation and return the number of affected rows.
    pub async fn execute(&self, operation: DbOperation) -> Result<u64, DbError> {
        let (sql, params) = build_sql(&operation);
        let param_refs: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let client = self.pool.get().await?;
        match client.execute(&sql, &param_refs[..]).await {
            Ok(rows) => Ok(rows),
            Err(e) => {
                let error: DbError = e.into();
                tracing::error!("SQL execution failed\n  SQL: {}\n  Error: {}", sql, error);
                Err(error)
            }
        }
    }
}

fn build_sql(operation: &DbOperation) -> (String, Vec<SqlParam>) {
    match operation {
        DbOperation::Upsert {
            table,
            columns,
            values,
            conflict_columns,
            update_columns,
        } => build_upsert_sql(table, columns, values, conflict_columns, update_columns),
        DbOperation::Update {
            table,
            set_columns,
            key_column,
            key_value,
        } => build_update_sql(table, set_columns, key_column, key_value),
    }
}

fn build_upsert_sql(
    table: &str,
    columns: &[String],
    values: &[DbValue],
    conflict_columns: &[String],
    update_columns: &[String],
) -> (String, Vec<SqlParam>) {
    let params: Vec<SqlParam> = values.iter().map(convert_db_value).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${}", i)).collect();

    let conflict_action = if update_columns.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let assignments: Vec<String> = update_columns
            .iter()
            .map(|c| format!("{} = EXCLUDED.{}", quote_ident(c), quote_ident(c)))
            .collect();
        format!("DO UPDATE SET {}", assignments.join(", "))
    };

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}) {}",
        table,
        quote_cols(columns).join(", "),
        placeholders.join(", "),
        quote_cols(conflict_columns).join(", "),
        conflict_action,
    );
    (sql, params)
}

fn build_update_sql(
    table: &str,
    set_columns: &[(String, DbValue)],
    key_column: &str,
    key_value: &DbValue,
) -> (String, Vec<SqlParam>) {
    let mut params: Vec<SqlParam> = Vec::with_capacity(set_columns.len() + 1);
    let assignments: Vec<String> = set_columns
        .iter()
        .enumerate()
        .map(|(i, (column, value))| {
            params.push(convert_db_value(value));
            format!("{} = ${}", quote_ident(column), i + 1)
        })
        .collect();
    params.push(convert_db_value(key_value));

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ${}",
        table,
        assignments.join(", "),
        quote_ident(key_column),
        params.len(),
    );
    (sql, params)
}

/// Convert a DbValue to a SqlParam for binding.
fn convert_db_value(value: &DbValue) -> SqlParam {
    match value {
        DbValue::Null => SqlParam::Null,
        DbValue::Bool(v) => SqlParam::Bool(*v),
        // BIGINT is signed; values past its range saturate instead of wrapping.
        DbValue::Uint64(v) => SqlParam::Int64(i64::try_from(*v).unwrap_or(i64::MAX)),
        DbValue::Text(v) => SqlParam::Text(v.clone()),
    }
}

/// Quote an identifier for safe inclusion in SQL.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_cols(columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| quote_ident(c)).collect()
}

/// Parameter bound to a SQL statement.
#[derive(Debug)]
enum SqlParam {
    Null,
    Bool(bool),
    Int64(i64),
    Text(String),
}

impl ToSql for SqlParam {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlParam::Null => Ok(IsNull::Yes),
            SqlParam::Bool(v) => v.to_sql(ty, out),
            SqlParam::Int64(v) => v.to_sql(ty, out),
            SqlParam::Text(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}
