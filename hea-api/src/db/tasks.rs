//! Leakage task database operations
//!
//! Resubmission under an existing task id replaces the prior row and its
//! suggestions wholesale; replacement and result attachment are each one
//! transaction so a concurrent poll never observes a half-written task.

use sqlx::{Row, SqlitePool};

use hea_common::{Error, Result};

use crate::models::{
    AnalysisResult, LeakageTask, Suggestion, TaskDecision, TaskState, TaskType,
};

/// Replace (or create) a task row
///
/// Deletes any existing row with the same task id together with its
/// suggestions, then inserts the normalized record. Full-replace semantics,
/// not merge.
pub async fn replace_task(pool: &SqlitePool, task: &LeakageTask) -> Result<()> {
    // Serialize JSON columns before opening the transaction
    let rgb_photo_ids = serde_json::to_string(&task.rgb_photo_ids)
        .map_err(|e| Error::Internal(format!("Failed to serialize rgb_photo_ids: {}", e)))?;
    let thermal_photo_ids = serde_json::to_string(&task.thermal_photo_ids)
        .map_err(|e| Error::Internal(format!("Failed to serialize thermal_photo_ids: {}", e)))?;

    let mut tx = pool.begin().await?;

    // Suggestions are deleted explicitly; the schema's ON DELETE CASCADE
    // only applies when sqlite foreign key enforcement is enabled.
    sqlx::query("DELETE FROM suggestions WHERE task_id = ?")
        .bind(&task.task_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM leakage_tasks WHERE task_id = ?")
        .bind(&task.task_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO leakage_tasks (
            task_id, user_id, title, task_type, state, decision,
            closed_result, inside_temp, outside_temp,
            rgb_photo_ids, thermal_photo_ids,
            leak_severity, energy_loss_value, energy_loss_cost,
            savings_percent, savings_cost, report_photo_id
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.task_id)
    .bind(&task.user_id)
    .bind(&task.title)
    .bind(task.task_type.map(|t| t.as_str()))
    .bind(task.state.as_str())
    .bind(task.decision.as_str())
    .bind(&task.closed_result)
    .bind(task.inside_temp)
    .bind(task.outside_temp)
    .bind(&rgb_photo_ids)
    .bind(&thermal_photo_ids)
    .bind(&task.leak_severity)
    .bind(task.energy_loss_value)
    .bind(task.energy_loss_cost)
    .bind(task.savings_percent)
    .bind(task.savings_cost)
    .bind(&task.report_photo_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(())
}

/// Load a task row by id
pub async fn get_task(pool: &SqlitePool, task_id: &str) -> Result<Option<LeakageTask>> {
    let row = sqlx::query(
        r#"
        SELECT task_id, user_id, title, task_type, state, decision,
               closed_result, inside_temp, outside_temp,
               rgb_photo_ids, thermal_photo_ids,
               leak_severity, energy_loss_value, energy_loss_cost,
               savings_percent, savings_cost, report_photo_id
        FROM leakage_tasks
        WHERE task_id = ?
        "#,
    )
    .bind(task_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let rgb_photo_ids: String = row.get("rgb_photo_ids");
            let rgb_photo_ids: Vec<String> = serde_json::from_str(&rgb_photo_ids)
                .map_err(|e| Error::Internal(format!("Failed to parse rgb_photo_ids: {}", e)))?;

            let thermal_photo_ids: String = row.get("thermal_photo_ids");
            let thermal_photo_ids: Vec<String> = serde_json::from_str(&thermal_photo_ids)
                .map_err(|e| {
                    Error::Internal(format!("Failed to parse thermal_photo_ids: {}", e))
                })?;

            let task_type: Option<String> = row.get("task_type");
            let state: String = row.get("state");
            let decision: String = row.get("decision");

            Ok(Some(LeakageTask {
                task_id: row.get("task_id"),
                user_id: row.get("user_id"),
                title: row.get("title"),
                task_type: TaskType::coerce(task_type.as_deref()),
                state: TaskState::coerce(Some(&state)),
                decision: TaskDecision::coerce(Some(&decision)),
                closed_result: row.get("closed_result"),
                inside_temp: row.get("inside_temp"),
                outside_temp: row.get("outside_temp"),
                rgb_photo_ids,
                thermal_photo_ids,
                leak_severity: row.get("leak_severity"),
                energy_loss_value: row.get("energy_loss_value"),
                energy_loss_cost: row.get("energy_loss_cost"),
                savings_percent: row.get("savings_percent"),
                savings_cost: row.get("savings_cost"),
                report_photo_id: row.get("report_photo_id"),
            }))
        }
        None => Ok(None),
    }
}

/// Load the suggestions attached to a task
pub async fn get_suggestions(pool: &SqlitePool, task_id: &str) -> Result<Vec<Suggestion>> {
    let rows = sqlx::query(
        r#"
        SELECT suggestion_id, task_id, title, subtitle, difficulty,
               cost_range, estimated_reduction, lifetime
        FROM suggestions
        WHERE task_id = ?
        ORDER BY suggestion_id
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| Suggestion {
            suggestion_id: row.get("suggestion_id"),
            task_id: row.get("task_id"),
            title: row.get("title"),
            subtitle: row.get("subtitle"),
            difficulty: row.get("difficulty"),
            cost_range: row.get("cost_range"),
            estimated_reduction: row.get("estimated_reduction"),
            lifetime: row.get("lifetime"),
        })
        .collect())
}

/// Commit an analysis result onto a task row
///
/// Transitions the task to `open`, overwrites the five result fields and the
/// report photo reference, and inserts the generated suggestions, all in one
/// transaction. Fails with `NotFound` if the task row vanished.
pub async fn attach_analysis(
    pool: &SqlitePool,
    task_id: &str,
    report_photo_id: Option<&str>,
    result: &AnalysisResult,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE leakage_tasks
        SET state = ?,
            leak_severity = ?,
            energy_loss_value = ?,
            energy_loss_cost = ?,
            savings_percent = ?,
            savings_cost = ?,
            report_photo_id = ?
        WHERE task_id = ?
        "#,
    )
    .bind(TaskState::Open.as_str())
    .bind(&result.leak_severity)
    .bind(result.energy_loss_value)
    .bind(result.energy_loss_cost)
    .bind(result.savings_percent)
    .bind(result.savings_cost)
    .bind(report_photo_id)
    .bind(task_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(Error::NotFound(format!(
            "Task not found while committing analysis: {}",
            task_id
        )));
    }

    for suggestion in &result.suggestions {
        sqlx::query(
            r#"
            INSERT INTO suggestions (
                suggestion_id, task_id, title, subtitle, difficulty,
                cost_range, estimated_reduction, lifetime
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&suggestion.suggestion_id)
        .bind(task_id)
        .bind(&suggestion.title)
        .bind(&suggestion.subtitle)
        .bind(&suggestion.difficulty)
        .bind(&suggestion.cost_range)
        .bind(&suggestion.estimated_reduction)
        .bind(&suggestion.lifetime)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}
