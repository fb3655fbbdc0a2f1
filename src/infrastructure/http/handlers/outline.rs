//! Outline HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{PatchOutlineEntry, SaveOutline};
use crate::domain::book::OutlineEntry;
use crate::infrastructure::http::dto::{
    ApiResponse, PatchOutlineEntryRequest, SaveOutlineRequest, SaveOutlineResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 保存大纲，skipChapterSync 为 false 时服务端先做完整重同步
pub async fn save_outline(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<SaveOutlineRequest>,
) -> Result<Json<ApiResponse<SaveOutlineResponse>>, ApiError> {
    let saved = state
        .save_outline_handler
        .handle(SaveOutline {
            book_id,
            entries: req.chapters.into_iter().map(Into::into).collect(),
            suggestions: req.suggestions,
            skip_chapter_sync: req.skip_chapter_sync,
        })
        .await?;

    Ok(Json(ApiResponse::success(SaveOutlineResponse {
        outline: saved.outline,
        resync: saved.resync.map(Into::into),
    })))
}

/// 编辑单个大纲条目
pub async fn patch_outline_entry(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<PatchOutlineEntryRequest>,
) -> Result<Json<ApiResponse<OutlineEntry>>, ApiError> {
    let entry = state
        .patch_outline_entry_handler
        .handle(PatchOutlineEntry {
            book_id,
            entry_id: req.chapter_id,
            title: req.title,
            description: req.description,
            key_points: req.key_points,
        })
        .await?;

    Ok(Json(ApiResponse::success(entry)))
}
