//! Database access for the audit backend
//!
//! All tables live in a single sqlite database. Timestamps are stored as
//! RFC 3339 text, list-valued columns as JSON text.

pub mod tasks;
pub mod users;

use hea_common::Result;
use sqlx::SqlitePool;

/// Initialize backend tables
///
/// Creates the task, suggestion, user, and media tables if they don't exist.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leakage_tasks (
            task_id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL DEFAULT '',
            task_type TEXT,
            state TEXT NOT NULL DEFAULT 'draft',
            decision TEXT NOT NULL DEFAULT 'no_decision',
            closed_result TEXT,
            inside_temp REAL,
            outside_temp REAL,
            rgb_photo_ids TEXT NOT NULL DEFAULT '[]',
            thermal_photo_ids TEXT NOT NULL DEFAULT '[]',
            leak_severity TEXT,
            energy_loss_value REAL,
            energy_loss_cost REAL,
            savings_percent REAL,
            savings_cost REAL,
            report_photo_id TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS suggestions (
            suggestion_id TEXT PRIMARY KEY,
            task_id TEXT NOT NULL REFERENCES leakage_tasks(task_id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            subtitle TEXT NOT NULL,
            difficulty TEXT NOT NULL,
            cost_range TEXT NOT NULL,
            estimated_reduction TEXT NOT NULL,
            lifetime TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            zip_code TEXT,
            energy_company TEXT,
            retrofit_budget TEXT,
            ownership TEXT,
            appliances TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS media (
            media_id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            content_type TEXT NOT NULL,
            kind TEXT NOT NULL,
            size INTEGER NOT NULL,
            data BLOB NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (leakage_tasks, suggestions, users, media)");

    Ok(())
}
