//! API handlers for the audit backend

pub mod auth;
pub mod health;
pub mod leak;
pub mod media;

pub use auth::auth_routes;
pub use health::health_routes;
pub use leak::leak_routes;
pub use media::media_routes;
