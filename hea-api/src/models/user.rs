//! User profile model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted user profile
///
/// `user_id` equals the verified identity subject declared at login. All
/// optional fields start as `NULL` and are filled by profile updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub zip_code: Option<String>,
    pub energy_company: Option<String>,
    pub retrofit_budget: Option<String>,
    pub ownership: Option<String>,
    pub appliances: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update
///
/// Only fields carrying `Some` are applied; `None` leaves the stored value
/// untouched. Every successful update refreshes `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub zip_code: Option<String>,
    pub energy_company: Option<String>,
    pub retrofit_budget: Option<String>,
    pub ownership: Option<String>,
    pub appliances: Option<Vec<String>>,
}
