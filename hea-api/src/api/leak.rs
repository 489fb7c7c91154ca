//! Leak detection API handlers
//!
//! POST /leakage/detect_leak accepts a multipart submission (owner id, task
//! descriptor, photo attachments), registers an analysis job, and returns
//! the job handle immediately. GET /leakage/detect_leak/{job_id} polls the
//! job. The analysis itself runs as background work scheduled at the end of
//! a successful submission.
//!
//! Ordering guarantee: the task row is committed before the job becomes
//! visible in the job store and before the worker is scheduled, so a poll
//! that observes `done` always finds the task row with its result.

use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    routing::{get, post},
    Json, Router,
};
use base64::{engine::general_purpose, Engine as _};
use futures::FutureExt;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    db,
    error::{ApiError, ApiResult},
    models::{JobStatus, LeakageTask, Suggestion, TaskDescriptor, TaskType},
    services::{analyzer, MediaKind},
    AppState,
};

/// POST /leakage/detect_leak response
#[derive(Debug, Serialize)]
pub struct DetectLeakResponse {
    #[serde(rename = "jobId")]
    pub job_id: Uuid,
    pub status: JobStatus,
}

/// Report returned when a job is done
#[derive(Debug, Serialize)]
pub struct TaskReport {
    #[serde(rename = "taskID")]
    pub task_id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub task_type: Option<TaskType>,
    #[serde(rename = "leakSeverity")]
    pub leak_severity: Option<String>,
    #[serde(rename = "energyLossValue")]
    pub energy_loss_value: Option<f64>,
    #[serde(rename = "energyLossCost")]
    pub energy_loss_cost: Option<f64>,
    #[serde(rename = "savingsPercent")]
    pub savings_percent: Option<f64>,
    #[serde(rename = "savingsCost")]
    pub savings_cost: Option<f64>,
    #[serde(rename = "reportPhotoID")]
    pub report_photo_id: Option<String>,
    pub suggestions: Vec<SuggestionView>,
}

/// Suggestion as rendered in a report
#[derive(Debug, Serialize)]
pub struct SuggestionView {
    #[serde(rename = "suggestionID")]
    pub suggestion_id: String,
    pub title: String,
    pub subtitle: String,
    pub difficulty: String,
    #[serde(rename = "costRange")]
    pub cost_range: String,
    #[serde(rename = "estimatedReduction")]
    pub estimated_reduction: String,
    pub lifetime: String,
}

impl From<Suggestion> for SuggestionView {
    fn from(s: Suggestion) -> Self {
        Self {
            suggestion_id: s.suggestion_id,
            title: s.title,
            subtitle: s.subtitle,
            difficulty: s.difficulty,
            cost_range: s.cost_range,
            estimated_reduction: s.estimated_reduction,
            lifetime: s.lifetime,
        }
    }
}

/// Report photo transported base64-encoded inside the poll response
#[derive(Debug, Serialize)]
pub struct ReportImage {
    #[serde(rename = "mediaId")]
    pub media_id: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub data: String,
}

struct MediaUpload {
    filename: String,
    content_type: String,
    data: Vec<u8>,
}

/// POST /leakage/detect_leak
///
/// Multipart fields: `uid`, `task_json`, and any number of parts whose
/// names start with `media`. Returns the job handle without waiting for
/// the analysis.
pub async fn detect_leak(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<DetectLeakResponse>> {
    let mut uid: Option<String> = None;
    let mut task_json: Option<String> = None;
    let mut uploads: Vec<MediaUpload> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart request: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "uid" => {
                uid = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read uid field: {}", e))
                })?);
            }
            "task_json" => {
                task_json = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read task_json field: {}", e))
                })?);
            }
            _ if name.starts_with("media") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("Failed to read media part {}: {}", name, e))
                })?;
                uploads.push(MediaUpload {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            // Unknown parts are ignored
            _ => {}
        }
    }

    let uid = uid.ok_or_else(|| ApiError::BadRequest("Missing uid field".to_string()))?;
    let task_json =
        task_json.ok_or_else(|| ApiError::BadRequest("Missing task_json field".to_string()))?;

    let descriptor: TaskDescriptor = serde_json::from_str(&task_json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid task_json: {}", e)))?;
    let task_id = descriptor
        .task_id()
        .ok_or_else(|| {
            ApiError::BadRequest("Missing taskID/taskId/id in task_json".to_string())
        })?
        .to_string();

    // Resubmission while a prior analysis for this task is in flight would
    // race the worker's result write against the row replacement; reject it.
    // Check-then-act: two submissions racing through this guard can both
    // pass before either registers its job. Closing that window needs a
    // combined check-and-reserve on the job store, which would have to run
    // before the task row is replaced and therefore before the row-commit
    // ordering point.
    if let Some(live) = state.jobs.live_job_for_task(&task_id).await {
        return Err(ApiError::Conflict(format!(
            "Analysis already in flight for task {} (job {})",
            task_id, live
        )));
    }

    // Attachments are stored before any task write; a storage failure here
    // aborts the whole submission, leaving no task row without its media.
    let mut rgb_refs = Vec::new();
    let mut thermal_refs = Vec::new();
    for upload in &uploads {
        let kind = MediaKind::classify(&upload.filename);
        let media_id = state
            .media
            .put(&upload.filename, &upload.content_type, kind, &upload.data)
            .await?;
        match kind {
            MediaKind::Rgb => rgb_refs.push(media_id),
            MediaKind::Thermal => thermal_refs.push(media_id),
        }
    }

    let task =
        LeakageTask::from_descriptor(task_id.clone(), uid, &descriptor, rgb_refs, thermal_refs);
    db::tasks::replace_task(&state.db, &task).await?;

    let job_id = Uuid::new_v4();
    state.jobs.create(job_id, &task_id).await?;

    tracing::info!(
        job_id = %job_id,
        task_id = %task_id,
        media_count = uploads.len(),
        "Leak analysis job queued"
    );

    let worker_state = state.clone();
    state
        .scheduler
        .spawn(run_analysis_job(worker_state, job_id).boxed());

    Ok(Json(DetectLeakResponse {
        job_id,
        status: JobStatus::Queued,
    }))
}

/// GET /leakage/detect_leak/{job_id}
///
/// Pure read over the job store and task store; never mutates state.
pub async fn poll_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<Value>> {
    let job = state
        .jobs
        .get(job_id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Job not found: {}", job_id)))?;

    match job.status {
        JobStatus::Done => {
            let task = db::tasks::get_task(&state.db, &job.task_id)
                .await?
                .ok_or_else(|| {
                    ApiError::Internal(format!(
                        "Task row missing for completed job {}",
                        job_id
                    ))
                })?;
            let suggestions = db::tasks::get_suggestions(&state.db, &job.task_id).await?;

            let image = match &task.report_photo_id {
                Some(media_id) => {
                    let blob = state.media.get(media_id).await?.ok_or_else(|| {
                        ApiError::Internal(format!(
                            "Report photo {} missing from media store",
                            media_id
                        ))
                    })?;
                    Some(ReportImage {
                        media_id: blob.media_id,
                        content_type: blob.content_type,
                        data: general_purpose::STANDARD.encode(&blob.data),
                    })
                }
                None => None,
            };

            let report = TaskReport {
                task_id: task.task_id,
                title: task.title,
                task_type: task.task_type,
                leak_severity: task.leak_severity,
                energy_loss_value: task.energy_loss_value,
                energy_loss_cost: task.energy_loss_cost,
                savings_percent: task.savings_percent,
                savings_cost: task.savings_cost,
                report_photo_id: task.report_photo_id,
                suggestions: suggestions.into_iter().map(SuggestionView::from).collect(),
            };

            Ok(Json(json!({
                "status": "done",
                "report": report,
                "image": image,
            })))
        }
        JobStatus::Error => Ok(Json(json!({
            "status": "error",
            "error": job.error.unwrap_or_else(|| "Unknown".to_string()),
        }))),
        status => Ok(Json(json!({ "status": status.as_str() }))),
    }
}

/// Background analysis worker
///
/// Failures never escape this function; they are recorded on the job store
/// as a terminal `error` state and surface only on the next poll.
async fn run_analysis_job(state: AppState, job_id: Uuid) {
    state.jobs.set_status(job_id, JobStatus::Processing).await;

    match analyze(&state, job_id).await {
        Ok(()) => {
            state.jobs.set_status(job_id, JobStatus::Done).await;
            tracing::info!(job_id = %job_id, "Analysis completed");
        }
        Err(e) => {
            tracing::error!(job_id = %job_id, error = %e, "Analysis failed");
            // Message first, then status: a concurrent poll that sees
            // `error` must also see the message.
            state.jobs.attach_error(job_id, e.to_string()).await;
            state.jobs.set_status(job_id, JobStatus::Error).await;
        }
    }
}

async fn analyze(state: &AppState, job_id: Uuid) -> anyhow::Result<()> {
    if !state.analysis_delay.is_zero() {
        tokio::time::sleep(state.analysis_delay).await;
    }

    let job = state
        .jobs
        .get(job_id)
        .await
        .context("job disappeared from the job store")?;

    // The submission commits the task row before scheduling the worker, so
    // an absent row means something deleted it underneath us. That is an
    // error, not a silent no-op.
    let task = db::tasks::get_task(&state.db, &job.task_id)
        .await?
        .with_context(|| format!("task {} missing from task store", job.task_id))?;

    let report_photo = task
        .rgb_photo_ids
        .first()
        .or_else(|| task.thermal_photo_ids.first())
        .cloned();

    let result = analyzer::run_analysis(&task.task_id);

    db::tasks::attach_analysis(&state.db, &task.task_id, report_photo.as_deref(), &result)
        .await?;

    Ok(())
}

/// Build leak detection routes
pub fn leak_routes() -> Router<AppState> {
    Router::new()
        .route("/leakage/detect_leak", post(detect_leak))
        .route("/leakage/detect_leak/:job_id", get(poll_job))
}
