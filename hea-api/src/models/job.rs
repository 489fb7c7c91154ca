//! Analysis job state machine
//!
//! A job is the ephemeral handle for one background analysis run. It moves
//! through `queued → processing → {done | error}`; the two final states are
//! terminal and a job never re-enters `queued`. Jobs live only in the job
//! store for the lifetime of the process; clients must treat job ids as
//! non-durable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Analysis job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Registered, worker not yet started
    Queued,
    /// Worker is running the analysis
    Processing,
    /// Analysis finished, results committed to the task row
    Done,
    /// Analysis failed with a captured message
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Check if the status is final (no further transitions)
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

/// One tracked analysis job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Generated job identifier (unique per submission)
    pub job_id: Uuid,
    /// Task id the analysis will write results onto
    pub task_id: String,
    /// Current status
    pub status: JobStatus,
    /// Captured failure message when status is `Error`
    pub error: Option<String>,
}

impl Job {
    pub fn new(job_id: Uuid, task_id: String) -> Self {
        Self {
            job_id,
            task_id,
            status: JobStatus::Queued,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Done.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn new_job_starts_queued() {
        let job = Job::new(Uuid::new_v4(), "T1".to_string());
        assert_eq!(job.status, JobStatus::Queued);
        assert!(job.error.is_none());
    }
}
