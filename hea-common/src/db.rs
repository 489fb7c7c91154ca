//! Database pool bootstrap

use crate::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize the sqlite connection pool
///
/// Opens (or creates) the database file at `db_path`. Table creation is the
/// responsibility of the service crate, which knows its own schema.
pub async fn init_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_database_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("hea.db");

        let pool = init_pool(&db_path).await.expect("pool should open");
        sqlx::query("CREATE TABLE t (id INTEGER)")
            .execute(&pool)
            .await
            .expect("write should succeed");

        assert!(db_path.exists());
    }
}
