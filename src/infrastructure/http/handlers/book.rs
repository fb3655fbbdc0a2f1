//! Book HTTP Handlers

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{CreateBook, DeleteBook, GetBook, ListBooks};
use crate::infrastructure::http::dto::{
    ApiResponse, BookDetailsResponse, BookResponse, CreateBookRequest, DeletedResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 列出所有书籍
pub async fn list_books(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BookResponse>>>, ApiError> {
    let books = state.list_books_handler.handle(ListBooks).await?;
    Ok(Json(ApiResponse::success(
        books.into_iter().map(BookResponse::from).collect(),
    )))
}

/// 创建书籍
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateBookRequest>,
) -> Result<Json<ApiResponse<BookResponse>>, ApiError> {
    let book = state
        .create_book_handler
        .handle(CreateBook {
            title: req.title,
            genre: req.genre,
            target_audience: req.target_audience,
            instructions: req.instructions,
        })
        .await?;

    Ok(Json(ApiResponse::success(book.into())))
}

/// 书籍详情（大纲 + 建议 + 章节）
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<ApiResponse<BookDetailsResponse>>, ApiError> {
    let details = state.get_book_handler.handle(GetBook { book_id }).await?;

    Ok(Json(ApiResponse::success(BookDetailsResponse {
        book: details.book.into(),
        outline: details.outline,
        chapters: details.chapters,
    })))
}

/// 删除书籍（级联删除大纲与章节）
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    state
        .delete_book_handler
        .handle(DeleteBook { book_id })
        .await?;

    Ok(Json(ApiResponse::success(DeletedResponse { id: book_id })))
}
