//! Data models for the audit backend

pub mod job;
pub mod task;
pub mod user;

pub use job::{Job, JobStatus};
pub use task::{
    AnalysisResult, LeakageTask, Suggestion, TaskDecision, TaskDescriptor, TaskState, TaskType,
};
pub use user::{ProfileChanges, UserProfile};
