//! Book Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRecord, BookRepositoryPort, ChapterRepositoryPort, OutlineRepositoryPort,
};
use crate::application::queries::{GetBook, ListBooks};
use crate::domain::book::{Chapter, Outline};

// ============================================================================
// Response DTOs
// ============================================================================

/// 书籍详情
#[derive(Debug, Clone)]
pub struct BookDetails {
    pub book: BookRecord,
    pub outline: Outline,
    /// 按 order 升序
    pub chapters: Vec<Chapter>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GetBook Handler
pub struct GetBookHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
}

impl GetBookHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            chapter_repo,
        }
    }

    pub async fn handle(&self, query: GetBook) -> Result<BookDetails, ApplicationError> {
        let book = self
            .book_repo
            .find_by_id(query.book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", query.book_id))?;

        let outline = self
            .outline_repo
            .find_by_book(query.book_id)
            .await?
            .into_outline();

        let chapters = self
            .chapter_repo
            .find_by_book(query.book_id)
            .await?
            .into_iter()
            .map(|r| r.into_chapter())
            .collect();

        Ok(BookDetails {
            book,
            outline,
            chapters,
        })
    }
}

/// ListBooks Handler
pub struct ListBooksHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
}

impl ListBooksHandler {
    pub fn new(book_repo: Arc<dyn BookRepositoryPort>) -> Self {
        Self { book_repo }
    }

    pub async fn handle(&self, _query: ListBooks) -> Result<Vec<BookRecord>, ApplicationError> {
        Ok(self.book_repo.find_all().await?)
    }
}
