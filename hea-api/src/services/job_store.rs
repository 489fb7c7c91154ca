//! In-process analysis job registry
//!
//! The job store is the shared mutable registry mapping job ids to their
//! status. It is deliberately behind a trait so a durable or distributed
//! backend can be injected without touching handler logic; the default
//! implementation is process-local and non-durable, so job ids do not
//! survive a restart. Entries are never expired (known growth limitation).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use hea_common::{Error, Result};

use crate::models::{Job, JobStatus};

/// Registry of analysis jobs, keyed by job id
///
/// All operations are O(1) by key, and each mutation is atomic with respect
/// to concurrent reads: a poll sees either the state before or after a
/// transition, never a partial update.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Register a new job in `queued` state; fails if the id is taken
    async fn create(&self, job_id: Uuid, task_id: &str) -> Result<()>;

    /// Transition a job to a new status
    async fn set_status(&self, job_id: Uuid, status: JobStatus);

    /// Record a failure message on a job
    async fn attach_error(&self, job_id: Uuid, message: String);

    /// Snapshot a job by id
    async fn get(&self, job_id: Uuid) -> Option<Job>;

    /// Find a non-terminal job referencing the given task id
    ///
    /// Used to reject resubmission of a task while its analysis is still
    /// in flight.
    async fn live_job_for_task(&self, task_id: &str) -> Option<Uuid>;
}

/// Default process-local job store
#[derive(Clone, Default)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job_id: Uuid, task_id: &str) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job_id) {
            return Err(Error::Internal(format!("Job id collision: {}", job_id)));
        }
        jobs.insert(job_id, Job::new(job_id, task_id.to_string()));
        Ok(())
    }

    async fn set_status(&self, job_id: Uuid, status: JobStatus) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) => job.status = status,
            None => tracing::warn!(job_id = %job_id, "Status update for unknown job"),
        }
    }

    async fn attach_error(&self, job_id: Uuid, message: String) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(&job_id) {
            Some(job) => job.error = Some(message),
            None => tracing::warn!(job_id = %job_id, "Error attached to unknown job"),
        }
    }

    async fn get(&self, job_id: Uuid) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    async fn live_job_for_task(&self, task_id: &str) -> Option<Uuid> {
        self.jobs
            .read()
            .await
            .values()
            .find(|job| job.task_id == task_id && !job.status.is_terminal())
            .map(|job| job.job_id)
    }
}
