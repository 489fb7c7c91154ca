//! Media retrieval endpoint

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::{
    error::{ApiError, ApiResult},
    AppState,
};

/// GET /media/{media_id}
///
/// Returns the stored blob with its original content type.
pub async fn get_media(
    State(state): State<AppState>,
    Path(media_id): Path<String>,
) -> ApiResult<Response> {
    let blob = state
        .media
        .get(&media_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Media not found: {}", media_id)))?;

    Ok(([(header::CONTENT_TYPE, blob.content_type)], blob.data).into_response())
}

/// Build media routes
pub fn media_routes() -> Router<AppState> {
    Router::new().route("/media/:media_id", get(get_media))
}
