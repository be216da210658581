use std::path::{Path, PathBuf};

use deadpool_postgres::Pool;

use super::error::DbError;

const MIGRATIONS_DIR: &str = "migrations";

/// Apply pending SQL migrations in filename order.
///
/// Applied migrations are tracked in a `_migrations` table; each pending
/// file runs inside one transaction together with its bookkeeping row.
pub async fn run(pool: &Pool) -> Result<(), DbError> {
    let mut client = pool.get().await?;

    client
        .execute(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
            &[],
        )
        .await?;

    let applied: Vec<String> = client
        .query("SELECT name FROM _migrations", &[])
        .await?
        .into_iter()
        .map(|row| row.get(0))
        .collect();

    let mut applied_now = 0;
    for (name, path) in migration_files(Path::new(MIGRATIONS_DIR))? {
        if applied.iter().any(|a| a == &name) {
            continue;
        }
        let sql = std::fs::read_to_string(&path)?;

        let transaction = client.transaction().await?;
        transaction
            .batch_execute(&sql)
            .await
            .map_err(|e| DbError::MigrationError(format!("{} failed: {}", name, e)))?;
        transaction
            .execute("INSERT INTO _migrations (name) VALUES ($1)", &[&name])
            .await?;
        transaction.commit().await?;

        tracing::info!("Applied migration {}", name);
        applied_now += 1;
    }

    if applied_now == 0 {
        tracing::debug!("Migrations up to date");
    }
    Ok(())
}

/// Migration files under `dir`, sorted by filename.
fn migration_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, DbError> {
    if !dir.is_dir() {
        return Err(DbError::MigrationError(format!(
            "migrations directory {} not found",
            dir.display()
        )));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("sql") {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            files.push((name.to_string(), path.clone()));
        }
    }
    files.sort();
    Ok(files)
}
