/// Attachment download
///
/// # Endpoint
///
/// ```text
/// GET /uploads/:filename
/// ```
///
/// A file is served only if one of the caller's tasks names it as its
/// attachment. Anything else, including files that exist on disk for another
/// user, is a 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    body::Body,
    extract::{Path, Request, State},
    response::{IntoResponse, Response},
};
use taskdesk_shared::{auth::middleware::CurrentUser, models::task::Task};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

const NOT_FOUND: &str = "File not found";

/// Stream an attachment with a content type guessed from its extension
pub async fn download(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(filename): Path<String>,
    req: Request,
) -> ApiResult<Response> {
    let Some(path) = state.uploads.path_for(&filename) else {
        debug!(user_id = user.id, filename = %filename, "Rejected unsanitized attachment name");
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    };

    if Task::find_by_attachment(&state.db, user.id, &filename)
        .await?
        .is_none()
    {
        debug!(user_id = user.id, filename = %filename, "Attachment not owned by caller");
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    if tokio::fs::metadata(&path).await.is_err() {
        debug!(path = %path.display(), "Attachment missing on disk");
        return Err(ApiError::NotFound(NOT_FOUND.to_string()));
    }

    let response = match ServeFile::new(&path).oneshot(req).await {
        Ok(response) => response,
        Err(never) => match never {},
    };

    Ok(response.map(Body::new).into_response())
}
