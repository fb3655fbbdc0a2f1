//! BookEditor - UI 层的变更入口
//!
//! 每个操作先同步更新乐观缓存（调用返回前 UI 即可读到新状态），再发起网络调用。
//! 异步操作总是返回 MutationOutcome，缓存不会停留在未定义状态。
//!
//! - move_entry: 本地立即生效，网络写入交给去抖队列
//! - 任何其他写操作之前，先把去抖中的重排发出去（章节批量总是先于大纲写入）
//! - insert/remove/resync: 完整重同步，最后保存大纲
//! - edit_entry: PATCH 单个条目
//! - 建议列表: 整体保存大纲
//! - delete_chapter: 破坏性操作，不做乐观更新

use std::sync::Arc;

use crate::application::ports::{
    BookCachePort, CacheError, ChapterSyncPort, EntryPatch, GatewayError, MutationOutcome,
    MutationState, OutlineSave, OutlineSyncPort, ReorderQueuePort,
};
use crate::application::sync::{settle_failure, Reconciler, SyncError};
use crate::domain::book::{mutations, BookId, BookSnapshot, ChapterId, EntryDraft, Mutation, SideEffect};

/// 单本书的编辑会话
pub struct BookEditor {
    book_id: BookId,
    cache: Arc<dyn BookCachePort>,
    chapters: Arc<dyn ChapterSyncPort>,
    outline: Arc<dyn OutlineSyncPort>,
    queue: Arc<dyn ReorderQueuePort>,
    reconciler: Reconciler,
}

impl BookEditor {
    /// 读取书籍并初始化缓存
    pub async fn open(
        book_id: BookId,
        cache: Arc<dyn BookCachePort>,
        chapters: Arc<dyn ChapterSyncPort>,
        outline: Arc<dyn OutlineSyncPort>,
        queue: Arc<dyn ReorderQueuePort>,
    ) -> Result<Self, SyncError> {
        let view = chapters.fetch_book(book_id).await?;
        cache.seed(view.into_snapshot());

        tracing::info!(book_id = %book_id, "Book editor opened");

        Ok(Self {
            book_id,
            reconciler: Reconciler::new(chapters.clone()),
            cache,
            chapters,
            outline,
            queue,
        })
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    /// 当前（可能未确认的）快照
    pub fn snapshot(&self) -> Option<BookSnapshot> {
        self.cache.current(self.book_id)
    }

    pub fn state(&self) -> Option<MutationState> {
        self.cache.state(self.book_id)
    }

    // ========================================================================
    // 结构变更
    // ========================================================================

    /// 移动条目，同步返回新快照
    pub fn move_entry(&self, from: usize, to: usize) -> Result<BookSnapshot, SyncError> {
        let Mutation { next, effects } = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::move_entry(s, from, to)),
        )?;

        for effect in effects {
            if let SideEffect::CoalescedReorder(payload) = effect {
                self.queue.schedule(self.book_id, next.version, payload);
            }
        }

        Ok(next)
    }

    /// 在 at 处插入条目（at == 长度 表示追加）
    pub async fn insert_entry(
        &self,
        at: usize,
        draft: EntryDraft,
    ) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::insert_entry(s, at, draft)),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    pub async fn remove_entry(&self, index: usize) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::remove_entry(s, index)),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    /// 以当前大纲做一次完整重同步
    pub async fn resync(&self) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let snapshot = self
            .snapshot()
            .ok_or(CacheError::NotLoaded(self.book_id))?;
        Ok(self.push_structure(&snapshot).await)
    }

    /// 编辑单个条目
    pub async fn edit_entry(
        &self,
        index: usize,
        draft: EntryDraft,
    ) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::edit_entry(s, index, draft)),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    // ========================================================================
    // 写作建议
    // ========================================================================

    pub async fn add_suggestion(&self, text: String) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| Ok(mutations::add_suggestion(s, text))),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    pub async fn edit_suggestion(
        &self,
        index: usize,
        text: String,
    ) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::edit_suggestion(s, index, text)),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    pub async fn remove_suggestion(&self, index: usize) -> Result<MutationOutcome, SyncError> {
        self.flush_pending().await;
        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::remove_suggestion(s, index)),
        )?;
        Ok(self.dispatch(mutation).await)
    }

    // ========================================================================
    // 章节
    // ========================================================================

    /// 删除章节
    ///
    /// 服务端拒绝时返回错误，缓存保持不变；成功后在本地移除并前移后续章节。
    pub async fn delete_chapter(&self, chapter_id: ChapterId) -> Result<BookSnapshot, SyncError> {
        self.flush_pending().await;

        if let Err(e) = self.chapters.delete_chapter(self.book_id, chapter_id).await {
            tracing::error!(
                book_id = %self.book_id,
                chapter_id = %chapter_id,
                error = %e,
                "Chapter delete rejected"
            );
            return Err(e.into());
        }

        let mutation = self.cache.apply(
            self.book_id,
            Box::new(move |s: &BookSnapshot| mutations::remove_chapter(s, chapter_id)),
        )?;
        self.cache
            .confirm(self.book_id, mutation.next.version, None);

        tracing::info!(book_id = %self.book_id, chapter_id = %chapter_id, "Chapter deleted");
        Ok(mutation.next)
    }

    /// 立即发送未发送的重排
    pub async fn flush(&self) -> Option<MutationOutcome> {
        self.queue.flush_now(self.book_id).await
    }

    // ========================================================================
    // 内部
    // ========================================================================

    /// 写操作前先把去抖中的重排发出去，保证服务端章节顺序与本地一致
    async fn flush_pending(&self) {
        if let Some(outcome) = self.queue.flush_now(self.book_id).await {
            tracing::debug!(
                book_id = %self.book_id,
                outcome = ?outcome,
                "Flushed pending reorder before write"
            );
        }
    }

    /// 按顺序执行副作用，遇到第一个失败即停止
    async fn dispatch(&self, mutation: Mutation) -> MutationOutcome {
        let version = mutation.next.version;
        let mut outcome = MutationOutcome::Confirmed;

        for effect in mutation.effects {
            outcome = match effect {
                SideEffect::CoalescedReorder(payload) => {
                    self.queue.schedule(self.book_id, version, payload);
                    continue;
                }
                SideEffect::Resync => self.push_structure(&mutation.next).await,
                SideEffect::SaveOutline => self.save_outline(&mutation.next).await,
                SideEffect::PatchEntry { entry_id } => {
                    let Some(entry) = mutation.next.outline.entries.iter().find(|e| e.id == entry_id)
                    else {
                        continue;
                    };
                    let patch = EntryPatch {
                        entry_id,
                        title: entry.full_title.clone(),
                        description: entry.description.clone(),
                        key_points: entry.key_points.clone(),
                    };
                    match self.outline.patch_outline_entry(self.book_id, &patch).await {
                        Ok(()) => {
                            self.cache.confirm(self.book_id, version, None);
                            MutationOutcome::Confirmed
                        }
                        Err(e) => self.settle(version, &e).await,
                    }
                }
            };
            if outcome != MutationOutcome::Confirmed {
                break;
            }
        }

        outcome
    }

    /// 完整重同步 → 保存大纲（跳过服务端同步）→ 采用服务端章节
    async fn push_structure(&self, snapshot: &BookSnapshot) -> MutationOutcome {
        let version = snapshot.version;

        let report = match self
            .reconciler
            .resync(self.book_id, &snapshot.outline.entries)
            .await
        {
            Ok(report) => report,
            Err(e) => {
                return match e.gateway() {
                    Some(gateway) => self.settle(version, gateway).await,
                    None => MutationOutcome::KeptOptimistic,
                };
            }
        };

        let save = OutlineSave {
            outline: snapshot.outline.clone(),
            skip_chapter_sync: true,
        };
        if let Err(e) = self.outline.save_outline(self.book_id, &save).await {
            return self.settle(version, &e).await;
        }

        self.cache.confirm(self.book_id, version, report.chapters);
        MutationOutcome::Confirmed
    }

    async fn save_outline(&self, snapshot: &BookSnapshot) -> MutationOutcome {
        let save = OutlineSave {
            outline: snapshot.outline.clone(),
            skip_chapter_sync: true,
        };
        match self.outline.save_outline(self.book_id, &save).await {
            Ok(()) => {
                self.cache.confirm(self.book_id, snapshot.version, None);
                MutationOutcome::Confirmed
            }
            Err(e) => self.settle(snapshot.version, &e).await,
        }
    }

    async fn settle(&self, version: u64, error: &GatewayError) -> MutationOutcome {
        settle_failure(
            self.cache.as_ref(),
            self.chapters.as_ref(),
            self.book_id,
            version,
            error,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{BookView, ReorderQueuePort};
    use crate::domain::book::{check_contiguity, Chapter, Outline, OutlineEntry};
    use crate::infrastructure::adapters::{BackendCall, BackendOp, FakeBookBackend};
    use crate::infrastructure::memory::InMemoryBookCache;
    use crate::infrastructure::worker::{ReorderCoalescer, ReorderCoalescerConfig};
    use std::time::Duration;

    struct Fixture {
        backend: Arc<FakeBookBackend>,
        editor: BookEditor,
        original: BookSnapshot,
    }

    async fn fixture(titles: &[&str]) -> Fixture {
        fixture_with(titles, titles.len()).await
    }

    /// 只为前 chapter_count 个条目建章节
    async fn fixture_with(titles: &[&str], chapter_count: usize) -> Fixture {
        let backend = Arc::new(FakeBookBackend::new());
        let outline = Outline::new(
            titles
                .iter()
                .map(|t| OutlineEntry::new(*t, format!("{} notes", t), vec![]))
                .collect(),
            vec![],
        );
        let chapters = outline
            .entries
            .iter()
            .enumerate()
            .take(chapter_count)
            .map(|(i, e)| {
                Chapter::new(e.full_title.clone(), format!("<p>draft of {}</p>", titles[i]), i as u32 + 1)
            })
            .collect();
        let book_id = backend.insert_book(outline, chapters);

        let cache = Arc::new(InMemoryBookCache::new());
        let queue: Arc<dyn ReorderQueuePort> = ReorderCoalescer::spawn(
            ReorderCoalescerConfig::default(),
            cache.clone(),
            backend.clone(),
            backend.clone(),
        );
        let editor = BookEditor::open(book_id, cache, backend.clone(), backend.clone(), queue)
            .await
            .unwrap();
        let original = editor.snapshot().unwrap();
        backend.clear_calls();

        Fixture {
            backend,
            editor,
            original,
        }
    }

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            custom_title: title.to_string(),
            description: String::new(),
            key_points: vec![],
        }
    }

    fn batches(backend: &FakeBookBackend) -> Vec<Vec<ChapterId>> {
        backend
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::ReorderChapters(updates) => {
                    Some(updates.into_iter().map(|u| u.id).collect())
                }
                _ => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_updates_local_view_before_any_write() {
        let f = fixture(&["X", "Y", "Z", "W"]).await;

        let next = f.editor.move_entry(2, 0).unwrap();

        let customs: Vec<&str> = next
            .outline
            .entries
            .iter()
            .map(|e| e.custom_title.as_str())
            .collect();
        assert_eq!(customs, vec!["Z", "X", "Y", "W"]);
        let titles: Vec<&str> = next.chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Introduction: Z",
                "Chapter 1: X",
                "Chapter 2: Y",
                "Conclusion: W"
            ]
        );
        assert!(f.backend.calls().is_empty());
        assert!(f.editor.state().unwrap().is_pending());

        let outcome = f.editor.flush().await;
        assert_eq!(outcome, Some(MutationOutcome::Confirmed));

        let sent = batches(&f.backend);
        assert_eq!(sent.len(), 1);
        let expected: Vec<ChapterId> = [2, 0, 1, 3]
            .iter()
            .map(|&i| f.original.chapters[i].id)
            .collect();
        assert_eq!(sent[0], expected);

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.chapters, next.chapters);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_moves_send_one_cumulative_batch() {
        let f = fixture(&["A", "B", "C", "D"]).await;

        f.editor.move_entry(0, 3).unwrap();
        f.editor.move_entry(0, 3).unwrap();
        let last = f.editor.move_entry(1, 2).unwrap();

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert!(batches(&f.backend).is_empty());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let sent = batches(&f.backend);
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            last.chapters.iter().map(|c| c.id).collect::<Vec<_>>()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_flushes_pending_move_first() {
        let f = fixture(&["A", "B", "C", "D"]).await;

        f.editor.move_entry(3, 0).unwrap();
        let outcome = f.editor.insert_entry(4, draft("E")).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Confirmed);

        let calls = f.backend.calls();
        let first_batch = calls
            .iter()
            .position(|c| matches!(c, BackendCall::ReorderChapters(_)))
            .unwrap();
        let create = calls
            .iter()
            .position(|c| matches!(c, BackendCall::CreateChapter { .. }))
            .unwrap();
        assert!(first_batch < create);
        assert_eq!(batches(&f.backend).len(), 2);

        let snapshot = f.editor.snapshot().unwrap();
        let orders: Vec<u32> = snapshot.chapters.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4, 5]);
        assert_eq!(snapshot.chapters[0].id, f.original.chapters[3].id);
        assert_eq!(snapshot.chapters[0].content, f.original.chapters[3].content);
        assert_eq!(snapshot.chapters[4].title, "Conclusion: E");
        assert_eq!(
            f.editor.state(),
            Some(MutationState::Confirmed {
                version: snapshot.version
            })
        );
    }

    #[tokio::test]
    async fn test_remove_entry_deletes_highest_chapter_and_keeps_content() {
        let f = fixture(&["A", "B", "C", "D", "E"]).await;

        let outcome = f.editor.remove_entry(1).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Confirmed);

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.chapters.len(), 4);
        assert!(server
            .chapters
            .iter()
            .all(|c| c.id != f.original.chapters[4].id));
        for chapter in &server.chapters {
            let before = f
                .original
                .chapters
                .iter()
                .find(|c| c.id == chapter.id)
                .unwrap();
            assert_eq!(chapter.content, before.content);
        }
        assert_eq!(f.editor.snapshot().unwrap().chapters, server.chapters);
    }

    #[tokio::test]
    async fn test_edit_entry_patches_and_retitles_chapter() {
        let f = fixture(&["A", "B", "C"]).await;

        let outcome = f
            .editor
            .edit_entry(1, draft("Middle Game"))
            .await
            .unwrap();
        assert_eq!(outcome, MutationOutcome::Confirmed);

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.outline.entries[1].full_title, "Chapter 1: Middle Game");
        assert_eq!(server.chapters[1].title, "Chapter 1: Middle Game");
        assert_eq!(server.chapters[1].content, f.original.chapters[1].content);
        assert!(matches!(
            f.backend.calls().last(),
            Some(BackendCall::PatchOutlineEntry(_))
        ));
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_optimistic_suggestion() {
        let f = fixture(&["A", "B"]).await;
        f.backend
            .fail_next(BackendOp::SaveOutline, GatewayError::from_errno(409, "busy"));

        let outcome = f.editor.add_suggestion("More dialogue".into()).await.unwrap();

        assert_eq!(outcome, MutationOutcome::KeptOptimistic);
        assert_eq!(
            f.editor.snapshot().unwrap().outline.suggestions,
            vec!["More dialogue".to_string()]
        );
    }

    #[tokio::test]
    async fn test_hard_failure_revalidates_from_server() {
        let f = fixture(&["A", "B"]).await;
        f.backend
            .fail_next(BackendOp::SaveOutline, GatewayError::from_errno(500, "db down"));

        let outcome = f.editor.add_suggestion("Lost".into()).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Reverted);
        let snapshot = f.editor.snapshot().unwrap();
        assert!(snapshot.outline.suggestions.is_empty());
        assert!(snapshot.version > f.original.version);
    }

    #[tokio::test]
    async fn test_hard_failure_without_server_rolls_back() {
        let f = fixture(&["A", "B"]).await;
        f.editor.add_suggestion("Kept".into()).await.unwrap();
        f.backend
            .fail_next(BackendOp::SaveOutline, GatewayError::Network("offline".into()));
        f.backend
            .fail_next(BackendOp::Fetch, GatewayError::Network("offline".into()));

        let outcome = f.editor.edit_suggestion(0, "Changed".into()).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Reverted);
        assert_eq!(
            f.editor.snapshot().unwrap().outline.suggestions,
            vec!["Kept".to_string()]
        );
        assert!(matches!(
            f.editor.state(),
            Some(MutationState::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_rejected_chapter_delete_leaves_cache_untouched() {
        let f = fixture(&["A", "B", "C"]).await;
        f.backend
            .fail_next(BackendOp::Delete, GatewayError::from_errno(500, "locked"));

        let err = f
            .editor
            .delete_chapter(f.original.chapters[1].id)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Gateway(_)));
        assert_eq!(f.editor.snapshot().unwrap(), f.original);
    }

    #[tokio::test]
    async fn test_chapter_delete_renumbers_survivors() {
        let f = fixture(&["A", "B", "C"]).await;

        let next = f
            .editor
            .delete_chapter(f.original.chapters[0].id)
            .await
            .unwrap();

        let orders: Vec<u32> = next.chapters.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(
            next.chapters,
            f.backend.view(f.editor.book_id()).unwrap().chapters
        );
    }

    #[tokio::test]
    async fn test_out_of_range_move_is_rejected_locally() {
        let f = fixture(&["A", "B"]).await;

        let err = f.editor.move_entry(0, 5).unwrap_err();

        assert!(matches!(err, SyncError::Cache(CacheError::Mutation(_))));
        assert_eq!(f.editor.snapshot().unwrap(), f.original);
    }

    fn assert_aligned(view: &BookView, original: &BookSnapshot) {
        assert!(check_contiguity(&view.chapters).is_ok());
        assert_eq!(view.chapters.len(), view.outline.len());
        for (chapter, entry) in view.chapters.iter().zip(&view.outline.entries) {
            assert_eq!(chapter.title, entry.full_title);
        }
        for chapter in &view.chapters {
            if let Some(before) = original.chapters.iter().find(|c| c.id == chapter.id) {
                assert_eq!(chapter.content, before.content);
            }
        }
    }

    fn write_kinds(backend: &FakeBookBackend) -> Vec<&'static str> {
        backend
            .calls()
            .into_iter()
            .filter(|c| c.is_write())
            .map(|c| match c {
                BackendCall::ReorderChapters(_) => "reorder",
                BackendCall::CreateChapter { .. } => "create",
                BackendCall::DeleteChapter(_) => "delete",
                BackendCall::SaveOutline { .. } => "save_outline",
                BackendCall::PatchOutlineEntry(_) => "patch_entry",
                BackendCall::FetchBook(_) => "fetch",
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggestion_waits_for_pending_move() {
        let f = fixture(&["A", "B", "C", "D"]).await;

        f.editor.move_entry(3, 0).unwrap();
        let outcome = f.editor.add_suggestion("tip".into()).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Confirmed);

        assert_eq!(
            write_kinds(&f.backend),
            vec!["reorder", "save_outline", "save_outline"]
        );

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.outline.entries[0].full_title, "Introduction: D");
        assert_eq!(server.chapters[0].title, "Introduction: D");
        assert_eq!(server.chapters[0].id, f.original.chapters[3].id);
        assert_eq!(server.outline.suggestions, vec!["tip".to_string()]);
        assert_aligned(&server, &f.original);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_edit_waits_for_pending_move() {
        let f = fixture(&["A", "B", "C"]).await;

        f.editor.move_entry(0, 2).unwrap();
        let outcome = f.editor.edit_entry(0, draft("Opening")).await.unwrap();
        assert_eq!(outcome, MutationOutcome::Confirmed);

        assert_eq!(
            write_kinds(&f.backend),
            vec!["reorder", "save_outline", "patch_entry"]
        );

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.chapters[0].id, f.original.chapters[1].id);
        assert_eq!(server.chapters[0].title, "Introduction: Opening");
        assert_eq!(server.chapters[2].title, "Conclusion: A");
        assert_aligned(&server, &f.original);
        assert_eq!(f.editor.snapshot().unwrap().chapters, server.chapters);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_with_missing_chapter_resyncs_on_flush() {
        let f = fixture_with(&["A", "B", "C", "D"], 3).await;

        let local = f.editor.move_entry(0, 3).unwrap();
        assert_eq!(local.chapters.len(), 3);
        assert!(local.check_contiguity().is_ok());

        let outcome = f.editor.flush().await;
        assert_eq!(outcome, Some(MutationOutcome::Confirmed));

        let calls = f.backend.calls();
        assert!(calls.iter().any(|c| matches!(
            c,
            BackendCall::CreateChapter { order: Some(4), .. }
        )));
        assert_eq!(
            write_kinds(&f.backend),
            vec!["reorder", "create", "save_outline"]
        );

        let server = f.backend.view(f.editor.book_id()).unwrap();
        assert_eq!(server.outline.entries[3].full_title, "Conclusion: A");
        assert_aligned(&server, &f.original);
        assert_eq!(f.editor.snapshot().unwrap().chapters, server.chapters);
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Move(usize, usize),
        Insert(usize, &'static str),
        Remove(usize),
    }

    #[tokio::test(start_paused = true)]
    async fn test_mixed_sequences_end_contiguous_and_aligned() {
        use Op::*;

        let sequences: Vec<Vec<Op>> = vec![
            vec![Move(0, 3), Insert(2, "N"), Move(4, 0), Remove(1)],
            vec![Remove(0), Remove(0), Insert(0, "X"), Move(2, 0)],
            vec![Insert(4, "E"), Insert(0, "Z"), Move(5, 1), Move(1, 5), Remove(3)],
            vec![Move(1, 2), Move(2, 1), Move(0, 3)],
        ];

        for ops in sequences {
            let f = fixture(&["A", "B", "C", "D"]).await;

            for op in &ops {
                match *op {
                    Move(from, to) => {
                        f.editor.move_entry(from, to).unwrap();
                    }
                    Insert(at, title) => {
                        let outcome = f.editor.insert_entry(at, draft(title)).await.unwrap();
                        assert_eq!(outcome, MutationOutcome::Confirmed, "{:?}", ops);
                    }
                    Remove(index) => {
                        let outcome = f.editor.remove_entry(index).await.unwrap();
                        assert_eq!(outcome, MutationOutcome::Confirmed, "{:?}", ops);
                    }
                }
            }

            let outcome = f.editor.resync().await.unwrap();
            assert_eq!(outcome, MutationOutcome::Confirmed, "{:?}", ops);

            let server = f.backend.view(f.editor.book_id()).unwrap();
            assert_aligned(&server, &f.original);

            let local = f.editor.snapshot().unwrap();
            assert!(local.check_contiguity().is_ok());
            assert_eq!(local.chapters, server.chapters, "{:?}", ops);
            assert_eq!(local.outline.entries, server.outline.entries, "{:?}", ops);
        }
    }
}
