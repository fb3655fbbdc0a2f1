//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CreateBookHandler, CreateChapterHandler, DeleteBookHandler, DeleteChapterHandler,
    PatchOutlineEntryHandler, ReorderChaptersHandler, SaveOutlineHandler,
    UpdateChapterContentHandler,
    // Query handlers
    GetBookHandler, ListBooksHandler,
    // Ports
    BookRepositoryPort, ChapterRepositoryPort, OutlineRepositoryPort,
    // Sync
    Reconciler,
};
use crate::infrastructure::adapters::RepositoryChapterSync;
use crate::infrastructure::events::EventPublisher;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub book_repo: Arc<dyn BookRepositoryPort>,
    pub outline_repo: Arc<dyn OutlineRepositoryPort>,
    pub chapter_repo: Arc<dyn ChapterRepositoryPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub create_book_handler: CreateBookHandler,
    pub delete_book_handler: DeleteBookHandler,
    pub reorder_chapters_handler: ReorderChaptersHandler,
    pub create_chapter_handler: CreateChapterHandler,
    pub delete_chapter_handler: DeleteChapterHandler,
    pub update_chapter_content_handler: UpdateChapterContentHandler,
    pub save_outline_handler: SaveOutlineHandler,
    pub patch_outline_entry_handler: PatchOutlineEntryHandler,

    // ========== Query Handlers ==========
    pub get_book_handler: GetBookHandler,
    pub list_books_handler: ListBooksHandler,
}

impl AppState {
    /// 创建应用状态
    ///
    /// 保存大纲时的服务端重同步直接走本进程的仓储。
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        let server_sync = Arc::new(RepositoryChapterSync::new(
            book_repo.clone(),
            outline_repo.clone(),
            chapter_repo.clone(),
            event_publisher.clone(),
        ));

        Self {
            // Ports
            book_repo: book_repo.clone(),
            outline_repo: outline_repo.clone(),
            chapter_repo: chapter_repo.clone(),
            event_publisher: event_publisher.clone(),

            // Command handlers
            create_book_handler: CreateBookHandler::new(book_repo.clone(), event_publisher.clone()),
            delete_book_handler: DeleteBookHandler::new(book_repo.clone(), event_publisher.clone()),
            reorder_chapters_handler: ReorderChaptersHandler::new(
                book_repo.clone(),
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            create_chapter_handler: CreateChapterHandler::new(
                book_repo.clone(),
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            delete_chapter_handler: DeleteChapterHandler::new(
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            update_chapter_content_handler: UpdateChapterContentHandler::new(
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            save_outline_handler: SaveOutlineHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                Reconciler::new(server_sync),
                event_publisher.clone(),
            ),
            patch_outline_entry_handler: PatchOutlineEntryHandler::new(
                outline_repo.clone(),
                chapter_repo.clone(),
                event_publisher.clone(),
            ),

            // Query handlers
            get_book_handler: GetBookHandler::new(
                book_repo.clone(),
                outline_repo.clone(),
                chapter_repo.clone(),
            ),
            list_books_handler: ListBooksHandler::new(book_repo),
        }
    }
}
