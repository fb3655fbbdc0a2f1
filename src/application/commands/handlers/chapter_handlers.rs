//! Chapter Command Handlers
//!
//! 不变量: 任何可被外部观察到的时刻，书籍内章节 order 都唯一。

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    CreateChapter, DeleteChapter, ReorderChapters, UpdateChapterContent,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRepositoryPort, ChapterRecord, ChapterReorderRecord, ChapterRepositoryPort,
};
use crate::domain::word_count;
use crate::infrastructure::events::{BookEvent, EventPublisher};

async fn ensure_book(
    book_repo: &dyn BookRepositoryPort,
    book_id: Uuid,
) -> Result<(), ApplicationError> {
    book_repo
        .find_by_id(book_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApplicationError::not_found("Book", book_id))
}

// ============================================================================
// ReorderChapters
// ============================================================================

/// ReorderChapters Handler - 原子批量重排/改标题
///
/// 整批校验通过后才写入，任一项不合法则全部拒绝。
pub struct ReorderChaptersHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl ReorderChaptersHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            book_repo,
            chapter_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: ReorderChapters) -> Result<usize, ApplicationError> {
        let book_id = command.book_id;
        ensure_book(self.book_repo.as_ref(), book_id).await?;

        if command.updates.is_empty() {
            return Ok(0);
        }

        let existing = self.chapter_repo.find_by_book(book_id).await?;
        let current: HashMap<Uuid, u32> = existing.iter().map(|c| (c.id, c.order)).collect();

        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for update in &command.updates {
            if !current.contains_key(&update.chapter_id) {
                return Err(ApplicationError::not_found("Chapter", update.chapter_id));
            }
            if update.order == 0 {
                return Err(ApplicationError::validation(format!(
                    "Chapter order must be positive: {}",
                    update.chapter_id
                )));
            }
            if !ids.insert(update.chapter_id) {
                return Err(ApplicationError::validation(format!(
                    "Chapter listed twice in batch: {}",
                    update.chapter_id
                )));
            }
            if !orders.insert(update.order) {
                return Err(ApplicationError::validation(format!(
                    "Duplicate target order in batch: {}",
                    update.order
                )));
            }
        }

        // 未出现在批量中的章节保持原 order，不能与目标 order 冲突
        if let Some(untouched) = existing
            .iter()
            .find(|c| !ids.contains(&c.id) && orders.contains(&c.order))
        {
            return Err(ApplicationError::conflict(format!(
                "Order {} is held by chapter {} outside the batch",
                untouched.order, untouched.id
            )));
        }

        let records: Vec<ChapterReorderRecord> = command
            .updates
            .iter()
            .map(|u| ChapterReorderRecord {
                id: u.chapter_id,
                order: u.order,
                title: u.title.clone(),
            })
            .collect();

        self.chapter_repo.reorder_batch(book_id, &records).await?;

        tracing::info!(book_id = %book_id, count = records.len(), "Chapters reordered");
        self.event_publisher.publish(BookEvent::ChaptersReordered {
            book_id,
            count: records.len(),
        });

        Ok(records.len())
    }
}

// ============================================================================
// CreateChapter
// ============================================================================

/// CreateChapter Handler
///
/// 指定的 order 已被占用时拒绝（从不覆盖），未指定时追加到末尾。
pub struct CreateChapterHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl CreateChapterHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            book_repo,
            chapter_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: CreateChapter) -> Result<ChapterRecord, ApplicationError> {
        let book_id = command.book_id;
        ensure_book(self.book_repo.as_ref(), book_id).await?;

        let order = match command.order {
            Some(0) => {
                return Err(ApplicationError::validation("Chapter order must be positive"));
            }
            Some(order) => order,
            None => self.chapter_repo.next_order(book_id).await?,
        };

        let now = Utc::now();
        let chapter = ChapterRecord {
            id: Uuid::new_v4(),
            book_id,
            title: command.title,
            word_count: word_count(&command.content),
            content: command.content,
            order,
            created_at: now,
            updated_at: now,
        };

        self.chapter_repo.create(&chapter).await?;

        tracing::info!(
            book_id = %book_id,
            chapter_id = %chapter.id,
            order = order,
            "Chapter created"
        );
        self.event_publisher.publish(BookEvent::ChapterCreated {
            book_id,
            chapter_id: chapter.id,
            order,
        });

        Ok(chapter)
    }
}

// ============================================================================
// DeleteChapter
// ============================================================================

/// DeleteChapter Handler - 删除并在同一事务内前移后续章节
pub struct DeleteChapterHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl DeleteChapterHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            chapter_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: DeleteChapter) -> Result<(), ApplicationError> {
        let DeleteChapter {
            book_id,
            chapter_id,
        } = command;

        if !self
            .chapter_repo
            .delete_and_renumber(book_id, chapter_id)
            .await?
        {
            return Err(ApplicationError::not_found("Chapter", chapter_id));
        }

        tracing::info!(book_id = %book_id, chapter_id = %chapter_id, "Chapter deleted");
        self.event_publisher.publish(BookEvent::ChapterDeleted {
            book_id,
            chapter_id,
        });

        Ok(())
    }
}

// ============================================================================
// UpdateChapterContent
// ============================================================================

/// UpdateChapterContent Handler - 替换正文并重算字数
pub struct UpdateChapterContentHandler {
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl UpdateChapterContentHandler {
    pub fn new(
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            chapter_repo,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        command: UpdateChapterContent,
    ) -> Result<ChapterRecord, ApplicationError> {
        let UpdateChapterContent {
            book_id,
            chapter_id,
            content,
        } = command;

        let words = word_count(&content);
        if !self
            .chapter_repo
            .update_content(book_id, chapter_id, &content, words)
            .await?
        {
            return Err(ApplicationError::not_found("Chapter", chapter_id));
        }

        let chapter = self
            .chapter_repo
            .find_by_id(book_id, chapter_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Chapter", chapter_id))?;

        tracing::info!(
            book_id = %book_id,
            chapter_id = %chapter_id,
            word_count = words,
            "Chapter content updated"
        );
        self.event_publisher.publish(BookEvent::ChapterUpdated {
            book_id,
            chapter_id,
            word_count: words,
        });

        Ok(chapter)
    }
}
