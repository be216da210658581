use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Pool error: {0}")]
    PoolError(#[from] deadpool_postgres::PoolError),

    #[error("Postgres error: {}", format_pg_error(.0))]
    PostgresError(#[from] tokio_postgres::Error),

    #[error("Pool build error: {0}")]
    BuildError(#[from] deadpool_postgres::BuildError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),
}

/// Include the server-side detail and violated constraint in the rendered
/// error when the server reported them.
fn format_pg_error(err: &tokio_postgres::Error) -> String {
    let mut message = err.to_string();
    if let Some(db_err) = err.as_db_error() {
        if let Some(detail) = db_err.detail() {
            message.push_str(&format!(" (detail: {})", detail));
        }
        if let Some(constraint) = db_err.constraint() {
            message.push_str(&format!(" (constraint: {})", constraint));
        }
    }
    message
}
