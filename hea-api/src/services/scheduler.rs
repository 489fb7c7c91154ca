//! Background work scheduling seam
//!
//! The submission handler schedules the analysis worker through this trait
//! instead of calling `tokio::spawn` directly, so tests can intercept or
//! serialize scheduling. The completion signal is the job status transition
//! recorded by the worker itself.

use futures::future::BoxFuture;

/// Narrow interface for scheduling fire-and-forget background work
pub trait Scheduler: Send + Sync {
    fn spawn(&self, work: BoxFuture<'static, ()>);
}

/// Default scheduler backed by the tokio runtime
#[derive(Clone, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn spawn(&self, work: BoxFuture<'static, ()>) {
        tokio::spawn(work);
    }
}
