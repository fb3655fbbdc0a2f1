//! Repository Chapter Sync - 服务端进程内的章节同步
//!
//! 保存大纲且未跳过章节同步时，服务端用它驱动 Reconciler，
//! 走与 REST 接口相同的命令处理器（同样的校验、事务和事件）。

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::commands::handlers::{
    CreateChapterHandler, DeleteChapterHandler, ReorderChaptersHandler,
};
use crate::application::ports::{
    BookRepositoryPort, BookView, ChapterRepositoryPort, ChapterSyncPort, GatewayError,
    OutlineRepositoryPort,
};
use crate::application::queries::handlers::GetBookHandler;
use crate::application::{
    ApplicationError, ChapterOrderUpdate, CreateChapter, DeleteChapter, GetBook, ReorderChapters,
};
use crate::domain::book::{BookId, Chapter, ChapterId, ChapterUpdate, NewChapter};
use crate::infrastructure::events::EventPublisher;

impl From<ApplicationError> for GatewayError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => GatewayError::NotFound(e.to_string()),
            ApplicationError::Conflict(msg) => GatewayError::Conflict(msg),
            ApplicationError::ValidationError(msg) => GatewayError::Rejected { errno: 400, message: msg },
            other => GatewayError::Rejected {
                errno: 500,
                message: other.to_string(),
            },
        }
    }
}

/// 基于仓储的章节同步
pub struct RepositoryChapterSync {
    get_book: GetBookHandler,
    reorder: ReorderChaptersHandler,
    create: CreateChapterHandler,
    delete: DeleteChapterHandler,
}

impl RepositoryChapterSync {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            get_book: GetBookHandler::new(
                book_repo.clone(),
                outline_repo,
                chapter_repo.clone(),
            ),
            reorder: ReorderChaptersHandler::new(
                book_repo.clone(),
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            create: CreateChapterHandler::new(
                book_repo,
                chapter_repo.clone(),
                event_publisher.clone(),
            ),
            delete: DeleteChapterHandler::new(chapter_repo, event_publisher),
        }
    }
}

#[async_trait]
impl ChapterSyncPort for RepositoryChapterSync {
    async fn fetch_book(&self, book_id: BookId) -> Result<BookView, GatewayError> {
        let details = self
            .get_book
            .handle(GetBook {
                book_id: *book_id.as_uuid(),
            })
            .await?;

        Ok(BookView {
            book_id,
            outline: details.outline,
            chapters: details.chapters,
        })
    }

    async fn reorder_chapters(
        &self,
        book_id: BookId,
        updates: &[ChapterUpdate],
    ) -> Result<(), GatewayError> {
        let command = ReorderChapters {
            book_id: *book_id.as_uuid(),
            updates: updates
                .iter()
                .map(|u| ChapterOrderUpdate {
                    chapter_id: *u.id.as_uuid(),
                    order: u.order,
                    title: u.title.clone(),
                })
                .collect(),
        };
        self.reorder.handle(command).await?;
        Ok(())
    }

    async fn create_chapter(
        &self,
        book_id: BookId,
        chapter: &NewChapter,
    ) -> Result<Chapter, GatewayError> {
        let record = self
            .create
            .handle(CreateChapter {
                book_id: *book_id.as_uuid(),
                title: chapter.title.clone(),
                content: chapter.content.clone(),
                order: chapter.order,
            })
            .await?;
        Ok(record.into_chapter())
    }

    async fn delete_chapter(
        &self,
        book_id: BookId,
        chapter_id: ChapterId,
    ) -> Result<(), GatewayError> {
        self.delete
            .handle(DeleteChapter {
                book_id: *book_id.as_uuid(),
                chapter_id: *chapter_id.as_uuid(),
            })
            .await?;
        Ok(())
    }
}
