//! Fake Book Backend - 用于测试的内存书籍存储
//!
//! 同时实现 ChapterSyncPort 和 OutlineSyncPort，记录每次调用，支持按操作注入失败。
//! 与真实服务端一样保证章节 order 唯一: 占用的 order 拒绝新建，删除后前移后续章节。

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::application::ports::{
    BookView, ChapterSyncPort, EntryPatch, GatewayError, OutlineSave, OutlineSyncPort,
};
use crate::domain::book::reconcile::{plan_entry_sync, plan_resync};
use crate::domain::book::{
    sort_by_order, BookId, Chapter, ChapterId, ChapterUpdate, NewChapter, Outline, OutlineEntryId,
};
use crate::domain::custom_title_of;

/// 调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchBook(BookId),
    ReorderChapters(Vec<ChapterUpdate>),
    CreateChapter { title: String, order: Option<u32> },
    DeleteChapter(ChapterId),
    SaveOutline { skip_chapter_sync: bool },
    PatchOutlineEntry(OutlineEntryId),
}

impl BackendCall {
    /// 是否为写操作
    pub fn is_write(&self) -> bool {
        !matches!(self, BackendCall::FetchBook(_))
    }
}

/// 可注入失败的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    Fetch,
    Reorder,
    Create,
    Delete,
    SaveOutline,
    PatchEntry,
}

#[derive(Debug, Clone, Default)]
struct FakeBook {
    outline: Outline,
    /// 按 order 升序
    chapters: Vec<Chapter>,
}

impl FakeBook {
    fn reorder(&mut self, updates: &[ChapterUpdate]) -> Result<(), GatewayError> {
        let mut ids = HashSet::new();
        let mut orders = HashSet::new();
        for update in updates {
            if !self.chapters.iter().any(|c| c.id == update.id) {
                return Err(GatewayError::NotFound(format!("Chapter {}", update.id)));
            }
            if update.order == 0 || !ids.insert(update.id) || !orders.insert(update.order) {
                return Err(GatewayError::Rejected {
                    errno: 400,
                    message: format!("Invalid batch entry for chapter {}", update.id),
                });
            }
        }

        if let Some(untouched) = self
            .chapters
            .iter()
            .find(|c| !ids.contains(&c.id) && orders.contains(&c.order))
        {
            return Err(GatewayError::Conflict(format!(
                "Order {} is held by chapter {}",
                untouched.order, untouched.id
            )));
        }

        for update in updates {
            if let Some(chapter) = self.chapters.iter_mut().find(|c| c.id == update.id) {
                chapter.order = update.order;
                chapter.title = update.title.clone();
            }
        }
        sort_by_order(&mut self.chapters);
        Ok(())
    }

    fn create(&mut self, new: &NewChapter) -> Result<Chapter, GatewayError> {
        let order = match new.order {
            Some(0) => {
                return Err(GatewayError::Rejected {
                    errno: 400,
                    message: "Chapter order must be positive".to_string(),
                })
            }
            Some(order) => {
                if self.chapters.iter().any(|c| c.order == order) {
                    return Err(GatewayError::Conflict(format!("Order {} is taken", order)));
                }
                order
            }
            None => self.chapters.iter().map(|c| c.order).max().unwrap_or(0) + 1,
        };

        let chapter = Chapter::new(new.title.clone(), new.content.clone(), order);
        self.chapters.push(chapter.clone());
        sort_by_order(&mut self.chapters);
        Ok(chapter)
    }

    fn delete(&mut self, chapter_id: ChapterId) -> Result<(), GatewayError> {
        let index = self
            .chapters
            .iter()
            .position(|c| c.id == chapter_id)
            .ok_or_else(|| GatewayError::NotFound(format!("Chapter {}", chapter_id)))?;
        let removed = self.chapters.remove(index);
        for chapter in &mut self.chapters {
            if chapter.order > removed.order {
                chapter.order -= 1;
            }
        }
        Ok(())
    }

    /// 服务端重同步（保存大纲且未跳过章节同步时）
    fn resync(&mut self) -> Result<(), GatewayError> {
        let plan = plan_resync(&self.outline.entries, &self.chapters);
        self.reorder(&plan.updates)?;
        for new in &plan.creates {
            self.create(new)?;
        }
        for chapter_id in &plan.deletes {
            self.delete(*chapter_id)?;
        }
        Ok(())
    }
}

/// 内存书籍存储
#[derive(Default)]
pub struct FakeBookBackend {
    books: DashMap<BookId, FakeBook>,
    calls: Mutex<Vec<BackendCall>>,
    failures: DashMap<BackendOp, VecDeque<GatewayError>>,
}

impl FakeBookBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 放入一本书，返回新的 BookId
    pub fn insert_book(&self, mut outline: Outline, mut chapters: Vec<Chapter>) -> BookId {
        let book_id = BookId::new();
        outline.retitle();
        sort_by_order(&mut chapters);
        self.books.insert(book_id, FakeBook { outline, chapters });
        book_id
    }

    /// 当前服务端状态（不记录调用）
    pub fn view(&self, book_id: BookId) -> Option<BookView> {
        self.books.get(&book_id).map(|book| BookView {
            book_id,
            outline: book.outline.clone(),
            chapters: book.chapters.clone(),
        })
    }

    /// 模拟其他客户端的并发修改
    pub fn edit_book(&self, book_id: BookId, edit: impl FnOnce(&mut Outline, &mut Vec<Chapter>)) {
        if let Some(mut book) = self.books.get_mut(&book_id) {
            let book = &mut *book;
            edit(&mut book.outline, &mut book.chapters);
            sort_by_order(&mut book.chapters);
        }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn clear_calls(&self) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// 下一次 op 调用返回 error（可多次调用以排队）
    pub fn fail_next(&self, op: BackendOp, error: GatewayError) {
        self.failures.entry(op).or_default().push_back(error);
    }

    fn record(&self, call: BackendCall) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(call);
    }

    fn injected(&self, op: BackendOp) -> Result<(), GatewayError> {
        match self.failures.get_mut(&op).and_then(|mut queue| queue.pop_front()) {
            Some(error) => {
                tracing::debug!(op = ?op, error = %error, "Injected backend failure");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn with_book<T>(
        &self,
        book_id: BookId,
        f: impl FnOnce(&mut FakeBook) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let mut book = self
            .books
            .get_mut(&book_id)
            .ok_or_else(|| GatewayError::NotFound(format!("Book {}", book_id)))?;
        f(&mut book)
    }
}

#[async_trait]
impl ChapterSyncPort for FakeBookBackend {
    async fn fetch_book(&self, book_id: BookId) -> Result<BookView, GatewayError> {
        self.record(BackendCall::FetchBook(book_id));
        self.injected(BackendOp::Fetch)?;
        self.view(book_id)
            .ok_or_else(|| GatewayError::NotFound(format!("Book {}", book_id)))
    }

    async fn reorder_chapters(
        &self,
        book_id: BookId,
        updates: &[ChapterUpdate],
    ) -> Result<(), GatewayError> {
        self.record(BackendCall::ReorderChapters(updates.to_vec()));
        self.injected(BackendOp::Reorder)?;
        self.with_book(book_id, |book| {
            // 整批校验失败时不留下部分修改
            let mut staged = book.clone();
            staged.reorder(updates)?;
            *book = staged;
            Ok(())
        })
    }

    async fn create_chapter(
        &self,
        book_id: BookId,
        chapter: &NewChapter,
    ) -> Result<Chapter, GatewayError> {
        self.record(BackendCall::CreateChapter {
            title: chapter.title.clone(),
            order: chapter.order,
        });
        self.injected(BackendOp::Create)?;
        self.with_book(book_id, |book| book.create(chapter))
    }

    async fn delete_chapter(
        &self,
        book_id: BookId,
        chapter_id: ChapterId,
    ) -> Result<(), GatewayError> {
        self.record(BackendCall::DeleteChapter(chapter_id));
        self.injected(BackendOp::Delete)?;
        self.with_book(book_id, |book| book.delete(chapter_id))
    }
}

#[async_trait]
impl OutlineSyncPort for FakeBookBackend {
    async fn save_outline(&self, book_id: BookId, save: &OutlineSave) -> Result<(), GatewayError> {
        self.record(BackendCall::SaveOutline {
            skip_chapter_sync: save.skip_chapter_sync,
        });
        self.injected(BackendOp::SaveOutline)?;
        self.with_book(book_id, |book| {
            let mut staged = book.clone();
            staged.outline = save.outline.clone();
            staged.outline.retitle();
            if !save.skip_chapter_sync {
                staged.resync()?;
            }
            *book = staged;
            Ok(())
        })
    }

    async fn patch_outline_entry(
        &self,
        book_id: BookId,
        patch: &EntryPatch,
    ) -> Result<(), GatewayError> {
        self.record(BackendCall::PatchOutlineEntry(patch.entry_id));
        self.injected(BackendOp::PatchEntry)?;
        self.with_book(book_id, |book| {
            let position = book
                .outline
                .position_of(patch.entry_id)
                .ok_or_else(|| GatewayError::NotFound(format!("Outline entry {}", patch.entry_id)))?;

            let entry = &mut book.outline.entries[position];
            entry.custom_title = custom_title_of(&patch.title);
            entry.description = patch.description.clone();
            entry.key_points = patch.key_points.clone();
            book.outline.retitle();

            if let Some(update) = plan_entry_sync(&book.outline.entries, position, &book.chapters) {
                if let Some(chapter) = book.chapters.iter_mut().find(|c| c.id == update.id) {
                    chapter.title = update.title;
                }
            }
            Ok(())
        })
    }
}
