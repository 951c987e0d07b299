//! Library Handlers - 曲库列表与刷新

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::application::{LibraryResponse, ListLibrary, RefreshLibrary};
use crate::infrastructure::http::dto::{ApiResponse, RefreshLibraryResult};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出曲库艺术家（快照为空时先拉取一次）
pub async fn list_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<LibraryResponse>>, ApiError> {
    let response = state.list_library_handler.handle(ListLibrary).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// 刷新曲库快照，并通知所有连接
pub async fn refresh_library(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RefreshLibraryResult>>, ApiError> {
    let response = state.refresh_library_handler.handle(RefreshLibrary).await?;
    state
        .event_publisher
        .publish_library_refreshed(response.artist_count);

    Ok(Json(ApiResponse::success(RefreshLibraryResult {
        artist_count: response.artist_count,
    })))
}
