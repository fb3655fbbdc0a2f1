//! Chapter HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CreateChapter, DeleteChapter, ReorderChapters, UpdateChapterContent};
use crate::domain::book::Chapter;
use crate::infrastructure::http::dto::{
    ApiResponse, CreateChapterRequest, DeletedResponse, ReorderChaptersRequest,
    ReorderChaptersResponse, UpdateChapterContentRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 原子批量重排/改标题
pub async fn reorder_chapters(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<ReorderChaptersRequest>,
) -> Result<Json<ApiResponse<ReorderChaptersResponse>>, ApiError> {
    let updated = state
        .reorder_chapters_handler
        .handle(ReorderChapters {
            book_id,
            updates: req.updates.into_iter().map(Into::into).collect(),
        })
        .await?;

    Ok(Json(ApiResponse::success(ReorderChaptersResponse { updated })))
}

/// 新建章节，order 被占用时返回 409
pub async fn create_chapter(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
    Json(req): Json<CreateChapterRequest>,
) -> Result<Json<ApiResponse<Chapter>>, ApiError> {
    let chapter = state
        .create_chapter_handler
        .handle(CreateChapter {
            book_id,
            title: req.title,
            content: req.content,
            order: req.order,
        })
        .await?;

    Ok(Json(ApiResponse::success(chapter.into_chapter())))
}

/// 删除章节，后续章节前移
pub async fn delete_chapter(
    State(state): State<Arc<AppState>>,
    Path((book_id, chapter_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    state
        .delete_chapter_handler
        .handle(DeleteChapter {
            book_id,
            chapter_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(DeletedResponse { id: chapter_id })))
}

/// 替换章节正文
pub async fn update_chapter_content(
    State(state): State<Arc<AppState>>,
    Path((book_id, chapter_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateChapterContentRequest>,
) -> Result<Json<ApiResponse<Chapter>>, ApiError> {
    let chapter = state
        .update_chapter_content_handler
        .handle(UpdateChapterContent {
            book_id,
            chapter_id,
            content: req.content,
        })
        .await?;

    Ok(Json(ApiResponse::success(chapter.into_chapter())))
}
