use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use vidmap_core::Coordinate;
use vidmap_db::{HistoryRow, NewHistoryEntry};

use crate::middleware::{AuthUser, RequestId};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct VideoAccessRequest {
    video_id: String,
    title: String,
    place_name: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct ClearedHistory {
    removed: u64,
}

/// History is private: the path id must be the caller's own.
fn ensure_own_history(request_id: &str, caller: AuthUser, user_id: i64) -> Result<(), ApiError> {
    if caller.0 == user_id {
        return Ok(());
    }
    tracing::warn!(caller = caller.0, requested = user_id, "cross-user history access denied");
    Err(ApiError::new(
        request_id,
        "forbidden",
        "history belongs to another user",
    ))
}

pub(super) async fn list_user_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<i64>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<HistoryRow>>>, ApiError> {
    ensure_own_history(&req_id.0, caller, user_id)?;

    let rows = vidmap_db::list_history(&state.pool, user_id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn clear_user_history(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(caller): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<ClearedHistory>>, ApiError> {
    ensure_own_history(&req_id.0, caller, user_id)?;

    let removed = vidmap_db::clear_history(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(user_id, removed, "history cleared");
    Ok(Json(ApiResponse {
        data: ClearedHistory { removed },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn register_video_access(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(body): Json<VideoAccessRequest>,
) -> Result<(StatusCode, Json<ApiResponse<HistoryRow>>), ApiError> {
    let coordinate = Coordinate::new(body.latitude, body.longitude)
        .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;
    let video_id = body.video_id.trim();
    if video_id.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "video_id must not be empty",
        ));
    }

    let entry = NewHistoryEntry {
        video_id,
        title: body.title.trim(),
        place_name: body
            .place_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty()),
        latitude: coordinate.latitude(),
        longitude: coordinate.longitude(),
    };

    let row = vidmap_db::insert_history_entry(&state.pool, user_id, &entry)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
