//! Outline Command Handlers
//!
//! 完整标题总是在服务端按 (position, total, customTitle) 重算，请求里的旧标题不会被保存。

use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{OutlineEntryInput, PatchOutlineEntry, SaveOutline};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    BookRepositoryPort, ChapterRepositoryPort, OutlineRecord, OutlineRepositoryPort,
};
use crate::application::sync::{Reconciler, ResyncReport};
use crate::domain::book::reconcile::plan_entry_sync;
use crate::domain::book::{BookId, Outline, OutlineEntry, OutlineEntryId};
use crate::domain::custom_title_of;
use crate::infrastructure::events::{BookEvent, EventPublisher};

// ============================================================================
// SaveOutline
// ============================================================================

/// 保存大纲响应
#[derive(Debug, Clone)]
pub struct SaveOutlineResponse {
    pub outline: Outline,
    /// 未跳过章节同步时的重同步结果
    pub resync: Option<ResyncReport>,
}

fn entry_from_input(input: OutlineEntryInput) -> OutlineEntry {
    let custom_title = input
        .custom_title
        .unwrap_or_else(|| custom_title_of(&input.title));
    let mut entry = OutlineEntry::new(custom_title, input.description, input.key_points);
    if let Some(id) = input.id {
        entry.id = OutlineEntryId::from_uuid(id);
    }
    entry
}

/// SaveOutline Handler
///
/// 未设置 skip_chapter_sync 时先做完整重同步，章节批量写入总是先于大纲保存。
pub struct SaveOutlineHandler {
    book_repo: Arc<dyn BookRepositoryPort>,
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    reconciler: Reconciler,
    event_publisher: Arc<EventPublisher>,
}

impl SaveOutlineHandler {
    pub fn new(
        book_repo: Arc<dyn BookRepositoryPort>,
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        reconciler: Reconciler,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            book_repo,
            outline_repo,
            reconciler,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: SaveOutline) -> Result<SaveOutlineResponse, ApplicationError> {
        let book_id = command.book_id;
        self.book_repo
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", book_id))?;

        let mut inputs = command.entries;
        inputs.sort_by_key(|e| e.order);

        let mut seen = HashSet::new();
        for id in inputs.iter().filter_map(|e| e.id) {
            if !seen.insert(id) {
                return Err(ApplicationError::validation(format!(
                    "Duplicate outline entry id: {}",
                    id
                )));
            }
        }

        let outline = Outline::new(
            inputs.into_iter().map(entry_from_input).collect(),
            command.suggestions,
        );

        let resync = if command.skip_chapter_sync {
            None
        } else {
            Some(
                self.reconciler
                    .resync(BookId::from_uuid(book_id), &outline.entries)
                    .await?,
            )
        };

        self.outline_repo
            .replace(book_id, &OutlineRecord::from_outline(book_id, &outline))
            .await?;

        tracing::info!(
            book_id = %book_id,
            entries = outline.len(),
            suggestions = outline.suggestions.len(),
            chapters_synced = resync.is_some(),
            "Outline saved"
        );
        self.event_publisher.publish(BookEvent::OutlineSaved {
            book_id,
            entries: outline.len(),
            chapters_synced: resync.is_some(),
        });

        Ok(SaveOutlineResponse { outline, resync })
    }
}

// ============================================================================
// PatchOutlineEntry
// ============================================================================

/// PatchOutlineEntry Handler
///
/// 更新单个条目，然后尽力把对应位置章节的标题改成新标题（正文不动，失败只记录日志）。
pub struct PatchOutlineEntryHandler {
    outline_repo: Arc<dyn OutlineRepositoryPort>,
    chapter_repo: Arc<dyn ChapterRepositoryPort>,
    event_publisher: Arc<EventPublisher>,
}

impl PatchOutlineEntryHandler {
    pub fn new(
        outline_repo: Arc<dyn OutlineRepositoryPort>,
        chapter_repo: Arc<dyn ChapterRepositoryPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            outline_repo,
            chapter_repo,
            event_publisher,
        }
    }

    pub async fn handle(&self, command: PatchOutlineEntry) -> Result<OutlineEntry, ApplicationError> {
        let book_id = command.book_id;
        let entry_id = OutlineEntryId::from_uuid(command.entry_id);

        let mut outline = self.outline_repo.find_by_book(book_id).await?.into_outline();
        let position = outline
            .position_of(entry_id)
            .ok_or_else(|| ApplicationError::not_found("OutlineEntry", command.entry_id))?;

        {
            let entry = &mut outline.entries[position];
            entry.custom_title = custom_title_of(&command.title);
            entry.description = command.description;
            entry.key_points = command.key_points;
        }
        outline.retitle();

        let record = OutlineRecord::from_outline(book_id, &outline)
            .entries
            .swap_remove(position);
        if !self.outline_repo.update_entry(&record).await? {
            return Err(ApplicationError::not_found("OutlineEntry", command.entry_id));
        }

        self.sync_chapter_title(book_id, &outline.entries, position)
            .await;

        tracing::info!(
            book_id = %book_id,
            entry_id = %entry_id,
            position = position,
            "Outline entry updated"
        );
        self.event_publisher.publish(BookEvent::OutlineEntryUpdated {
            book_id,
            entry_id: command.entry_id,
        });

        Ok(outline.entries.swap_remove(position))
    }

    async fn sync_chapter_title(&self, book_id: Uuid, entries: &[OutlineEntry], position: usize) {
        let chapters = match self.chapter_repo.find_by_book(book_id).await {
            Ok(records) => records.into_iter().map(|r| r.into_chapter()).collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(book_id = %book_id, error = %e, "Entry sync skipped: chapters unavailable");
                return;
            }
        };

        let Some(update) = plan_entry_sync(entries, position, &chapters) else {
            return;
        };

        match self
            .chapter_repo
            .update_title(book_id, *update.id.as_uuid(), &update.title)
            .await
        {
            Ok(true) => {
                tracing::debug!(
                    book_id = %book_id,
                    chapter_id = %update.id,
                    title = %update.title,
                    "Chapter retitled after entry edit"
                );
            }
            Ok(false) => {
                tracing::warn!(book_id = %book_id, chapter_id = %update.id, "Entry sync skipped: chapter gone");
            }
            Err(e) => {
                tracing::warn!(book_id = %book_id, chapter_id = %update.id, error = %e, "Entry sync failed");
            }
        }
    }
}
