//! Reorder Coalescer - 重排去抖
//!
//! 每次移动只替换待发送内容并把截止时间后推，截止时间到达且期间没有新的移动时才发送:
//! 先章节批量重排，成功后再保存大纲（skip_chapter_sync = true）。
//!
//! 章节数与条目数不一致时（payload.full_resync）改为完整重同步，再保存大纲；
//! 这个标记一旦出现，被后续移动替换的内容也保留它。
//!
//! 同一本书的发送串行执行，flush_now 会等待正在进行的发送结束。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::time::{Duration, Instant};

use crate::application::ports::{
    BookCachePort, ChapterSyncPort, MutationOutcome, OutlineSave, OutlineSyncPort,
    ReorderQueuePort,
};
use crate::application::sync::{settle_failure, Reconciler};
use crate::domain::book::{BookId, ReorderPayload};

/// Coalescer 配置
#[derive(Debug, Clone)]
pub struct ReorderCoalescerConfig {
    /// 最后一次移动之后等待的时间
    pub delay: Duration,
}

impl Default for ReorderCoalescerConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(500),
        }
    }
}

struct PendingReorder {
    payload: ReorderPayload,
    /// 产生该内容的缓存版本
    version: u64,
    deadline: Instant,
}

/// 重排去抖队列
pub struct ReorderCoalescer {
    config: ReorderCoalescerConfig,
    pending: DashMap<BookId, PendingReorder>,
    flush_locks: DashMap<BookId, Arc<Mutex<()>>>,
    wake_tx: mpsc::Sender<BookId>,
    cache: Arc<dyn BookCachePort>,
    chapters: Arc<dyn ChapterSyncPort>,
    outline: Arc<dyn OutlineSyncPort>,
}

impl ReorderCoalescer {
    pub fn new(
        config: ReorderCoalescerConfig,
        cache: Arc<dyn BookCachePort>,
        chapters: Arc<dyn ChapterSyncPort>,
        outline: Arc<dyn OutlineSyncPort>,
    ) -> (Self, mpsc::Receiver<BookId>) {
        let (wake_tx, wake_rx) = mpsc::channel(1000);
        (
            Self {
                config,
                pending: DashMap::new(),
                flush_locks: DashMap::new(),
                wake_tx,
                cache,
                chapters,
                outline,
            },
            wake_rx,
        )
    }

    /// 创建并启动后台 worker
    pub fn spawn(
        config: ReorderCoalescerConfig,
        cache: Arc<dyn BookCachePort>,
        chapters: Arc<dyn ChapterSyncPort>,
        outline: Arc<dyn OutlineSyncPort>,
    ) -> Arc<Self> {
        let (coalescer, wake_rx) = Self::new(config, cache, chapters, outline);
        let coalescer = Arc::new(coalescer);
        tokio::spawn(coalescer.clone().run_worker(wake_rx));
        coalescer
    }

    /// 后台 worker: 每本书收到第一次移动时启动一个计时任务
    pub async fn run_worker(self: Arc<Self>, mut wake_rx: mpsc::Receiver<BookId>) {
        tracing::info!(
            delay_ms = self.config.delay.as_millis() as u64,
            "Reorder coalescer started"
        );

        while let Some(book_id) = wake_rx.recv().await {
            let coalescer = self.clone();
            tokio::spawn(async move {
                coalescer.wait_and_flush(book_id).await;
            });
        }

        tracing::info!("Reorder coalescer stopped");
    }

    async fn wait_and_flush(&self, book_id: BookId) {
        loop {
            let Some(deadline) = self.pending.get(&book_id).map(|p| p.deadline) else {
                return;
            };
            tokio::time::sleep_until(deadline).await;

            if self.flush(book_id, true).await.is_some() {
                return;
            }
            // 截止时间被新的移动后推，继续等待
            if !self.pending.contains_key(&book_id) {
                return;
            }
        }
    }

    fn flush_lock(&self, book_id: BookId) -> Arc<Mutex<()>> {
        self.flush_locks
            .entry(book_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn flush(&self, book_id: BookId, only_if_due: bool) -> Option<MutationOutcome> {
        let lock = self.flush_lock(book_id);
        let _guard = lock.lock().await;

        let (_, pending) = if only_if_due {
            let now = Instant::now();
            self.pending.remove_if(&book_id, |_, p| p.deadline <= now)?
        } else {
            self.pending.remove(&book_id)?
        };

        Some(self.send(book_id, pending).await)
    }

    /// 章节批量 → 大纲保存，批量失败时不保存大纲
    async fn send(&self, book_id: BookId, pending: PendingReorder) -> MutationOutcome {
        let PendingReorder {
            payload, version, ..
        } = pending;

        tracing::debug!(
            book_id = %book_id,
            version = version,
            updates = payload.updates.len(),
            full_resync = payload.full_resync,
            "Flushing coalesced reorder"
        );

        let mut chapters = None;
        if payload.full_resync {
            match Reconciler::new(self.chapters.clone())
                .resync(book_id, &payload.outline.entries)
                .await
            {
                Ok(report) => chapters = report.chapters,
                Err(e) => {
                    return match e.gateway() {
                        Some(gateway) => {
                            settle_failure(
                                self.cache.as_ref(),
                                self.chapters.as_ref(),
                                book_id,
                                version,
                                gateway,
                            )
                            .await
                        }
                        None => MutationOutcome::KeptOptimistic,
                    };
                }
            }
        } else if !payload.updates.is_empty() {
            if let Err(e) = self
                .chapters
                .reorder_chapters(book_id, &payload.updates)
                .await
            {
                return settle_failure(
                    self.cache.as_ref(),
                    self.chapters.as_ref(),
                    book_id,
                    version,
                    &e,
                )
                .await;
            }
        }

        let save = OutlineSave {
            outline: payload.outline,
            skip_chapter_sync: true,
        };
        if let Err(e) = self.outline.save_outline(book_id, &save).await {
            return settle_failure(
                self.cache.as_ref(),
                self.chapters.as_ref(),
                book_id,
                version,
                &e,
            )
            .await;
        }

        self.cache.confirm(book_id, version, chapters);
        tracing::info!(book_id = %book_id, version = version, "Coalesced reorder persisted");
        MutationOutcome::Confirmed
    }
}

#[async_trait]
impl ReorderQueuePort for ReorderCoalescer {
    fn schedule(&self, book_id: BookId, version: u64, payload: ReorderPayload) {
        use dashmap::mapref::entry::Entry;

        let deadline = Instant::now() + self.config.delay;
        // 原子地检查并插入，只在第一次移动时唤醒 worker
        let is_new = match self.pending.entry(book_id) {
            Entry::Occupied(mut e) => {
                let mut payload = payload;
                payload.full_resync |= e.get().payload.full_resync;
                e.insert(PendingReorder {
                    payload,
                    version,
                    deadline,
                });
                false
            }
            Entry::Vacant(e) => {
                e.insert(PendingReorder {
                    payload,
                    version,
                    deadline,
                });
                true
            }
        };

        tracing::debug!(
            book_id = %book_id,
            version = version,
            replaced = !is_new,
            "Reorder scheduled"
        );

        if is_new {
            if let Err(e) = self.wake_tx.try_send(book_id) {
                tracing::error!(
                    book_id = %book_id,
                    error = %e,
                    "Reorder coalescer channel send failed"
                );
            }
        }
    }

    fn has_pending(&self, book_id: BookId) -> bool {
        self.pending.contains_key(&book_id)
    }

    fn discard(&self, book_id: BookId) -> bool {
        self.pending.remove(&book_id).is_some()
    }

    async fn flush_now(&self, book_id: BookId) -> Option<MutationOutcome> {
        self.flush(book_id, false).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{GatewayError, MutationState};
    use crate::domain::book::{mutations, BookSnapshot, Chapter, ChapterId, Outline, OutlineEntry};
    use crate::infrastructure::adapters::{BackendCall, BackendOp, FakeBookBackend};
    use crate::infrastructure::memory::InMemoryBookCache;

    struct Harness {
        backend: Arc<FakeBookBackend>,
        cache: Arc<InMemoryBookCache>,
        coalescer: Arc<ReorderCoalescer>,
        book_id: BookId,
    }

    fn harness(titles: &[&str]) -> Harness {
        let backend = Arc::new(FakeBookBackend::new());
        let outline = Outline::new(
            titles
                .iter()
                .map(|t| OutlineEntry::new(*t, "", vec![]))
                .collect(),
            vec![],
        );
        let chapters = outline
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| Chapter::new(e.full_title.clone(), format!("<p>{}</p>", i), i as u32 + 1))
            .collect();
        let book_id = backend.insert_book(outline, chapters);

        let cache = Arc::new(InMemoryBookCache::new());
        cache.seed(backend.view(book_id).unwrap().into_snapshot());

        let coalescer = ReorderCoalescer::spawn(
            ReorderCoalescerConfig::default(),
            cache.clone(),
            backend.clone(),
            backend.clone(),
        );
        backend.clear_calls();

        Harness {
            backend,
            cache,
            coalescer,
            book_id,
        }
    }

    impl Harness {
        fn move_entry(&self, from: usize, to: usize) -> BookSnapshot {
            let mutation = self
                .cache
                .apply(
                    self.book_id,
                    Box::new(move |s: &BookSnapshot| mutations::move_entry(s, from, to)),
                )
                .unwrap();
            for effect in mutation.effects {
                if let mutations::SideEffect::CoalescedReorder(payload) = effect {
                    self.coalescer
                        .schedule(self.book_id, mutation.next.version, payload);
                }
            }
            mutation.next
        }

        fn batches(&self) -> Vec<Vec<ChapterId>> {
            self.backend
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
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_resync_survives_later_positional_move() {
        let h = harness(&["A", "B", "C", "D"]);
        h.backend.edit_book(h.book_id, |_, chapters| {
            chapters.push(Chapter::new("Stray", "<p>stray</p>", 5));
        });
        h.cache.seed(h.backend.view(h.book_id).unwrap().into_snapshot());

        // 5 个章节对 4 个条目: 本地按重同步对齐，之后的移动是按位置的
        h.move_entry(0, 3);
        let last = h.move_entry(1, 2);
        assert_eq!(last.chapters.len(), 4);

        let outcome = h.coalescer.flush_now(h.book_id).await;
        assert_eq!(outcome, Some(MutationOutcome::Confirmed));

        let calls = h.backend.calls();
        assert!(calls.iter().any(|c| matches!(c, BackendCall::DeleteChapter(_))));
        assert!(matches!(
            calls.last(),
            Some(BackendCall::SaveOutline {
                skip_chapter_sync: true
            })
        ));

        let server = h.backend.view(h.book_id).unwrap();
        assert_eq!(server.chapters.len(), 4);
        for (chapter, entry) in server.chapters.iter().zip(&server.outline.entries) {
            assert_eq!(chapter.title, entry.full_title);
        }
        assert_eq!(h.cache.current(h.book_id).unwrap().chapters, server.chapters);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_collapsed_into_one_batch() {
        let h = harness(&["A", "B", "C", "D"]);

        h.move_entry(3, 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.move_entry(3, 0);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let last = h.move_entry(0, 1);

        // 最后一次移动后 450ms: 还没有发送
        tokio::time::sleep(Duration::from_millis(450)).await;
        assert!(h.batches().is_empty());
        assert!(h.coalescer.has_pending(h.book_id));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let batches = h.batches();
        assert_eq!(batches.len(), 1);

        let expected: Vec<ChapterId> = last.chapters.iter().map(|c| c.id).collect();
        assert_eq!(batches[0], expected);

        let calls = h.backend.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], BackendCall::ReorderChapters(_)));
        assert_eq!(
            calls[1],
            BackendCall::SaveOutline {
                skip_chapter_sync: true
            }
        );

        let server = h.backend.view(h.book_id).unwrap();
        assert_eq!(server.outline, last.outline);
        assert_eq!(
            server.chapters.iter().map(|c| c.id).collect::<Vec<_>>(),
            expected
        );
        assert_eq!(
            h.cache.state(h.book_id),
            Some(MutationState::Confirmed {
                version: last.version
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_send_separate_batches() {
        let h = harness(&["A", "B", "C"]);

        h.move_entry(0, 1);
        tokio::time::sleep(Duration::from_millis(600)).await;
        h.move_entry(1, 2);
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(h.batches().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_sends_immediately() {
        let h = harness(&["A", "B", "C"]);

        h.move_entry(2, 0);
        let outcome = h.coalescer.flush_now(h.book_id).await;

        assert_eq!(outcome, Some(MutationOutcome::Confirmed));
        assert_eq!(h.batches().len(), 1);
        assert!(!h.coalescer.has_pending(h.book_id));

        // 计时到期后不会重复发送
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(h.batches().len(), 1);
        assert_eq!(h.coalescer.flush_now(h.book_id).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_failure_skips_outline_save_and_reverts() {
        let h = harness(&["A", "B", "C"]);
        let before = h.cache.current(h.book_id).unwrap();
        h.backend
            .fail_next(BackendOp::Reorder, GatewayError::from_errno(500, "db down"));

        h.move_entry(0, 2);
        let outcome = h.coalescer.flush_now(h.book_id).await;

        assert_eq!(outcome, Some(MutationOutcome::Reverted));
        assert!(!h
            .backend
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::SaveOutline { .. })));

        let current = h.cache.current(h.book_id).unwrap();
        assert_eq!(current.outline, before.outline);
        assert_eq!(current.chapters, before.chapters);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_keeps_optimistic_view() {
        let h = harness(&["A", "B", "C"]);
        h.backend
            .fail_next(BackendOp::Reorder, GatewayError::from_errno(409, "busy"));

        let moved = h.move_entry(0, 2);
        let outcome = h.coalescer.flush_now(h.book_id).await;

        assert_eq!(outcome, Some(MutationOutcome::KeptOptimistic));
        assert_eq!(h.cache.current(h.book_id).unwrap(), moved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_discard_drops_pending_payload() {
        let h = harness(&["A", "B"]);

        h.move_entry(0, 1);
        assert!(h.coalescer.discard(h.book_id));
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(h.batches().is_empty());
    }
}
