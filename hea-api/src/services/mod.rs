//! Service layer for the audit backend

pub mod analyzer;
pub mod identity;
pub mod job_store;
pub mod media_store;
pub mod scheduler;

pub use identity::{
    GoogleTokenVerifier, IdentityClaims, IdentityVerifier, StaticTokenVerifier, VerifyError,
};
pub use job_store::{InMemoryJobStore, JobStore};
pub use media_store::{MediaBlob, MediaKind, MediaStore};
pub use scheduler::{Scheduler, TokioScheduler};
