//! hea-api library interface
//!
//! Backend for the home energy audit application: identity-token login,
//! user profiles, leakage task submission with photo evidence, and an
//! asynchronous analysis job per submission that clients poll.
//!
//! Exposes `AppState` and `build_router` for integration testing.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::services::{
    IdentityVerifier, InMemoryJobStore, JobStore, MediaStore, Scheduler, TokioScheduler,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (tasks, suggestions, users, media)
    pub db: SqlitePool,
    /// Analysis job registry (process-local by default)
    pub jobs: Arc<dyn JobStore>,
    /// Content store for uploaded photo evidence
    pub media: MediaStore,
    /// Identity token verifier
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Background work scheduler
    pub scheduler: Arc<dyn Scheduler>,
    /// Artificial delay the analysis worker sleeps before computing
    pub analysis_delay: Duration,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        verifier: Arc<dyn IdentityVerifier>,
        analysis_delay: Duration,
    ) -> Self {
        let media = MediaStore::new(db.clone());
        Self {
            db,
            jobs: Arc::new(InMemoryJobStore::new()),
            media,
            verifier,
            scheduler: Arc::new(TokioScheduler),
            analysis_delay,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::auth_routes())
        .merge(api::leak_routes())
        .merge(api::media_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
