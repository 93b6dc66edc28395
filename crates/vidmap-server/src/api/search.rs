use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use vidmap_youtube::{VideoError, VideoSummaryPage};

use crate::middleware::{AuthUser, RequestId};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub page_token: Option<String>,
}

fn map_video_error(request_id: String, error: &VideoError) -> ApiError {
    match error {
        VideoError::QuotaExceeded(reason) => {
            tracing::warn!(reason = %reason, "video search quota exceeded");
            ApiError::new(
                request_id,
                "quota_exceeded",
                "video search quota exceeded for this region",
            )
        }
        _ => {
            tracing::error!(error = %error, "video search failed");
            ApiError::new(request_id, "bad_gateway", "video provider request failed")
        }
    }
}

/// `GET /api/search?q=`: plain text video search proxied to the provider.
/// Text naming a deny-listed place is refused before any provider call.
pub(super) async fn search_videos(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<VideoSummaryPage>>, ApiError> {
    let Some(videos) = state.videos.as_ref() else {
        return Err(ApiError::new(
            req_id.0,
            "provider_unavailable",
            "video search is not configured",
        ));
    };
    let text = query.q.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "query parameter 'q' must not be empty",
        ));
    }

    let verdict = vidmap_core::evaluate(text, None);
    if let (true, Some(message)) = (verdict.restricted, verdict.message) {
        tracing::info!(user_id, reason = ?verdict.reason, "restricted search rejected");
        return Err(ApiError::new(req_id.0, "restricted", message));
    }

    tracing::debug!(user_id, query = text, "proxying video search");
    let page = videos
        .search_text(text, query.page_token.as_deref())
        .await
        .map_err(|e| map_video_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: page,
        meta: ResponseMeta::new(req_id.0),
    }))
}
