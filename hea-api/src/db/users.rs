//! User profile database operations

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use hea_common::{Error, Result};

use crate::models::{ProfileChanges, UserProfile};

/// Load a user profile by id
pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<Option<UserProfile>> {
    let row = sqlx::query(
        r#"
        SELECT user_id, zip_code, energy_company, retrofit_budget,
               ownership, appliances, created_at, updated_at
        FROM users
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let appliances: Option<String> = row.get("appliances");
            let appliances = appliances
                .map(|s| serde_json::from_str::<Vec<String>>(&s))
                .transpose()
                .map_err(|e| Error::Internal(format!("Failed to parse appliances: {}", e)))?;

            Ok(Some(UserProfile {
                user_id: row.get("user_id"),
                zip_code: row.get("zip_code"),
                energy_company: row.get("energy_company"),
                retrofit_budget: row.get("retrofit_budget"),
                ownership: row.get("ownership"),
                appliances,
                created_at: parse_timestamp(row.get("created_at"))?,
                updated_at: parse_timestamp(row.get("updated_at"))?,
            }))
        }
        None => Ok(None),
    }
}

/// Create a user profile with all optional fields empty
///
/// Used at first login; `created_at` and `updated_at` are both set to now.
pub async fn create_user(pool: &SqlitePool, user_id: &str) -> Result<()> {
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (user_id, created_at, updated_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Apply a partial profile update
///
/// Only fields present in `changes` overwrite stored values; every
/// successful update refreshes `updated_at`. Returns `false` if no profile
/// exists for the user id.
pub async fn update_profile(
    pool: &SqlitePool,
    user_id: &str,
    changes: &ProfileChanges,
) -> Result<bool> {
    let Some(current) = get_user(pool, user_id).await? else {
        return Ok(false);
    };

    let zip_code = changes.zip_code.clone().or(current.zip_code);
    let energy_company = changes.energy_company.clone().or(current.energy_company);
    let retrofit_budget = changes.retrofit_budget.clone().or(current.retrofit_budget);
    let ownership = changes.ownership.clone().or(current.ownership);
    let appliances = changes.appliances.clone().or(current.appliances);

    let appliances = appliances
        .map(|a| serde_json::to_string(&a))
        .transpose()
        .map_err(|e| Error::Internal(format!("Failed to serialize appliances: {}", e)))?;

    sqlx::query(
        r#"
        UPDATE users
        SET zip_code = ?,
            energy_company = ?,
            retrofit_budget = ?,
            ownership = ?,
            appliances = ?,
            updated_at = ?
        WHERE user_id = ?
        "#,
    )
    .bind(zip_code)
    .bind(energy_company)
    .bind(retrofit_budget)
    .bind(ownership)
    .bind(appliances)
    .bind(Utc::now().to_rfc3339())
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(true)
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        crate::db::init_schema(&pool).await.expect("schema");
        pool
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let pool = test_pool().await;
        create_user(&pool, "user-1").await.unwrap();

        let user = get_user(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(user.user_id, "user-1");
        assert!(user.zip_code.is_none());
        assert!(user.appliances.is_none());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields() {
        let pool = test_pool().await;
        create_user(&pool, "user-1").await.unwrap();

        let first = ProfileChanges {
            energy_company: Some("Duquesne Light".to_string()),
            ..Default::default()
        };
        assert!(update_profile(&pool, "user-1", &first).await.unwrap());

        let second = ProfileChanges {
            zip_code: Some("15213".to_string()),
            ..Default::default()
        };
        assert!(update_profile(&pool, "user-1", &second).await.unwrap());

        let user = get_user(&pool, "user-1").await.unwrap().unwrap();
        assert_eq!(user.zip_code.as_deref(), Some("15213"));
        assert_eq!(user.energy_company.as_deref(), Some("Duquesne Light"));
        assert!(user.updated_at >= user.created_at);
    }

    #[tokio::test]
    async fn update_unknown_user_reports_missing() {
        let pool = test_pool().await;
        let changes = ProfileChanges::default();
        assert!(!update_profile(&pool, "ghost", &changes).await.unwrap());
    }
}
