//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                                  GET     健康检查
//! - /api/books                                 GET     列出书籍
//! - /api/books                                 POST    创建书籍
//! - /api/books/:book_id                        GET     书籍详情（大纲 + 章节）
//! - /api/books/:book_id                        DELETE  删除书籍
//! - /api/books/:book_id/chapters               PATCH   原子批量重排/改标题
//! - /api/books/:book_id/chapters               POST    新建章节
//! - /api/books/:book_id/chapters/:chapter_id   PUT     更新章节正文
//! - /api/books/:book_id/chapters/:chapter_id   DELETE  删除章节
//! - /api/books/:book_id/outline                POST    保存大纲
//! - /api/books/:book_id/outline                PATCH   编辑单个条目
//! - /ws/events                                 WS      全局书籍事件
//! - /ws/books/:book_id                         WS      单本书事件

use axum::{
    routing::{get, patch, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/events", get(handlers::global_websocket_handler))
        .route("/ws/books/:book_id", get(handlers::book_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/books", book_routes())
}

/// Book 路由
fn book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::list_books).post(handlers::create_book))
        .route(
            "/:book_id",
            get(handlers::get_book).delete(handlers::delete_book),
        )
        .route(
            "/:book_id/chapters",
            patch(handlers::reorder_chapters).post(handlers::create_chapter),
        )
        .route(
            "/:book_id/chapters/:chapter_id",
            put(handlers::update_chapter_content).delete(handlers::delete_chapter),
        )
        .route(
            "/:book_id/outline",
            patch(handlers::patch_outline_entry).post(handlers::save_outline),
        )
}
