//! Login and profile API handlers
//!
//! Login verifies the client's identity token and ensures a profile row
//! exists for the declared uid, reporting whether it was created or already
//! present. Profile updates are partial: only fields present in the payload
//! are applied.

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db,
    error::{ApiError, ApiResult},
    models::ProfileChanges,
    AppState,
};

/// POST /auth/login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub id_token: String,
    pub uid: String,
}

/// POST /auth/login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: String,
    pub user_id: String,
    /// `created` on first login, `exists` afterwards
    pub action: String,
}

/// POST /auth/update_profile request
///
/// Field names follow the mobile client's intro-page payload.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub zip: Option<String>,
    pub ownership: Option<String>,
    #[serde(rename = "electricCompany")]
    pub electric_company: Option<String>,
    pub budget: Option<String>,
    pub appliances: Option<Vec<String>>,
}

/// POST /auth/update_profile response
#[derive(Debug, Serialize)]
pub struct ProfileUpdateResponse {
    pub status: String,
    #[serde(rename = "userID")]
    pub user_id: String,
}

/// POST /auth/login
///
/// Verify the identity token and ensure the user exists. The token's email
/// is not required to match the uid; the uid is the backend identity.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let claims = state.verifier.verify(&request.id_token).await?;

    tracing::debug!(subject = %claims.subject, uid = %request.uid, "Identity token verified");

    let action = if db::users::get_user(&state.db, &request.uid).await?.is_none() {
        db::users::create_user(&state.db, &request.uid).await?;
        "created"
    } else {
        "exists"
    };

    tracing::info!(uid = %request.uid, action = action, "User login");

    Ok(Json(LoginResponse {
        status: "success".to_string(),
        user_id: request.uid,
        action: action.to_string(),
    }))
}

/// POST /auth/update_profile
///
/// Partial update; absent fields leave stored values untouched. Every
/// successful update refreshes the profile's updated timestamp.
pub async fn update_profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileUpdateRequest>,
) -> ApiResult<Json<ProfileUpdateResponse>> {
    let changes = ProfileChanges {
        zip_code: request.zip,
        energy_company: request.electric_company,
        retrofit_budget: request.budget,
        ownership: request.ownership,
        appliances: request.appliances,
    };

    let found = db::users::update_profile(&state.db, &request.user_id, &changes).await?;
    if !found {
        return Err(ApiError::NotFound(format!(
            "User not found: {}",
            request.user_id
        )));
    }

    tracing::info!(uid = %request.user_id, "Profile updated");

    Ok(Json(ProfileUpdateResponse {
        status: "profile updated".to_string(),
        user_id: request.user_id,
    }))
}

/// Build auth routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/update_profile", post(update_profile))
}
