//! Reconciler - 完整重同步
//!
//! 让章节列表按位置与大纲一一对应，同时保留已有正文。
//!
//! 执行顺序:
//! 1. 读取服务端当前章节
//! 2. 重叠前缀的重排/改标题作为一个原子批量提交（即使没有变化也提交）
//! 3. 大纲多出的条目逐个新建章节
//! 4. 章节多出的部分从 order 最高的开始删除
//! 5. 重新读取并校验，不一致只记录警告
//!
//! 第 2 步失败时直接返回，不再新建/删除；第 3、4 步的单项失败记录后跳过。

use std::sync::Arc;

use crate::application::ports::{ChapterSyncPort, GatewayError};
use crate::application::sync::SyncError;
use crate::domain::book::reconcile::{plan_resync, verify_alignment};
use crate::domain::book::{BookId, Chapter, OutlineEntry};

/// 一次重同步的结果
#[derive(Debug, Clone, Default)]
pub struct ResyncReport {
    /// 实际改变了 order 或标题的章节数
    pub updated: usize,
    pub created: usize,
    pub deleted: usize,
    /// 被跳过的单项操作
    pub skipped: Vec<String>,
    /// 校验阶段发现的不一致
    pub warnings: Vec<String>,
    /// 重新读取到的章节（读取失败时为 None）
    pub chapters: Option<Vec<Chapter>>,
}

impl ResyncReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty()
    }
}

/// 完整重同步执行器
#[derive(Clone)]
pub struct Reconciler {
    chapters: Arc<dyn ChapterSyncPort>,
}

impl Reconciler {
    pub fn new(chapters: Arc<dyn ChapterSyncPort>) -> Self {
        Self { chapters }
    }

    /// 让章节与给定的大纲条目对齐
    pub async fn resync(
        &self,
        book_id: BookId,
        entries: &[OutlineEntry],
    ) -> Result<ResyncReport, SyncError> {
        let view = self.chapters.fetch_book(book_id).await?;
        let plan = plan_resync(entries, &view.chapters);

        tracing::debug!(
            book_id = %book_id,
            entries = entries.len(),
            chapters = view.chapters.len(),
            changed = plan.changed,
            creates = plan.creates.len(),
            deletes = plan.deletes.len(),
            "Resync planned"
        );

        let mut report = ResyncReport {
            updated: plan.changed,
            ..Default::default()
        };

        // 重叠前缀为空（空大纲或没有章节）时没有可提交的内容
        if !plan.updates.is_empty() {
            if let Err(e) = self.chapters.reorder_chapters(book_id, &plan.updates).await {
                tracing::error!(
                    book_id = %book_id,
                    updates = plan.updates.len(),
                    error = %e,
                    "Chapter reorder batch failed, aborting resync"
                );
                return Err(SyncError::BatchRejected(e));
            }
        }

        for chapter in &plan.creates {
            match self.chapters.create_chapter(book_id, chapter).await {
                Ok(created) => {
                    tracing::debug!(
                        book_id = %book_id,
                        chapter_id = %created.id,
                        order = created.order,
                        "Chapter created"
                    );
                    report.created += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        book_id = %book_id,
                        order = ?chapter.order,
                        error = %e,
                        "Chapter create failed, skipping"
                    );
                    report
                        .skipped
                        .push(format!("create {:?}: {}", chapter.title, e));
                }
            }
        }

        for chapter_id in &plan.deletes {
            match self.chapters.delete_chapter(book_id, *chapter_id).await {
                Ok(()) => report.deleted += 1,
                // 已经不存在，目标状态已达成
                Err(GatewayError::NotFound(_)) => {
                    tracing::warn!(
                        book_id = %book_id,
                        chapter_id = %chapter_id,
                        "Chapter already gone"
                    );
                    report.deleted += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        book_id = %book_id,
                        chapter_id = %chapter_id,
                        error = %e,
                        "Chapter delete failed, skipping"
                    );
                    report.skipped.push(format!("delete {}: {}", chapter_id, e));
                }
            }
        }

        match self.chapters.fetch_book(book_id).await {
            Ok(after) => {
                report.warnings = verify_alignment(entries, &after.chapters);
                for warning in &report.warnings {
                    tracing::warn!(book_id = %book_id, mismatch = %warning, "Resync verification mismatch");
                }
                report.chapters = Some(after.chapters);
            }
            Err(e) => {
                tracing::warn!(
                    book_id = %book_id,
                    error = %e,
                    "Resync verification fetch failed"
                );
                report
                    .warnings
                    .push(format!("verification fetch failed: {}", e));
            }
        }

        tracing::info!(
            book_id = %book_id,
            updated = report.updated,
            created = report.created,
            deleted = report.deleted,
            skipped = report.skipped.len(),
            warnings = report.warnings.len(),
            "Resync completed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::{BookSnapshot, Outline};
    use crate::infrastructure::adapters::{BackendCall, BackendOp, FakeBookBackend};

    fn outline(titles: &[&str]) -> Outline {
        Outline::new(
            titles
                .iter()
                .map(|t| OutlineEntry::new(*t, format!("about {}", t), vec![format!("{} point", t)]))
                .collect(),
            vec![],
        )
    }

    /// 按大纲建立已对齐的书籍，每章正文各不相同
    fn seeded(backend: &FakeBookBackend, titles: &[&str]) -> BookSnapshot {
        let outline = outline(titles);
        let chapters = outline
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| Chapter::new(e.full_title.clone(), format!("<p>written {}</p>", i), i as u32 + 1))
            .collect();
        let book_id = backend.insert_book(outline.clone(), chapters);
        backend.view(book_id).unwrap().into_snapshot()
    }

    fn reconciler(backend: &Arc<FakeBookBackend>) -> Reconciler {
        Reconciler::new(backend.clone())
    }

    fn assert_contiguous_and_titled(chapters: &[Chapter], entries: &[OutlineEntry]) {
        let mut sorted = chapters.to_vec();
        sorted.sort_by_key(|c| c.order);
        let orders: Vec<u32> = sorted.iter().map(|c| c.order).collect();
        let expected: Vec<u32> = (1..=entries.len() as u32).collect();
        assert_eq!(orders, expected);
        for (chapter, entry) in sorted.iter().zip(entries) {
            assert_eq!(chapter.title, entry.full_title);
        }
    }

    #[tokio::test]
    async fn test_aligned_book_only_sends_idempotent_batch() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["X", "Y", "Z", "W"]);
        backend.clear_calls();

        let report = reconciler(&backend)
            .resync(snapshot.book_id, &snapshot.outline.entries)
            .await
            .unwrap();

        assert_eq!(report.updated, 0);
        assert_eq!(report.created, 0);
        assert_eq!(report.deleted, 0);
        assert!(report.is_clean());

        let writes: Vec<BackendCall> = backend
            .calls()
            .into_iter()
            .filter(|c| c.is_write())
            .collect();
        assert_eq!(writes.len(), 1);
        match &writes[0] {
            BackendCall::ReorderChapters(updates) => assert_eq!(updates.len(), 4),
            other => panic!("unexpected write: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_growth_creates_two_chapters_after_batch() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["A", "B", "C"]);
        let before = snapshot.chapters.clone();
        backend.clear_calls();

        let grown = outline(&["A", "B", "D", "E", "C"]);
        let report = reconciler(&backend)
            .resync(snapshot.book_id, &grown.entries)
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert!(report.is_clean());

        let calls = backend.calls();
        let batch_at = calls
            .iter()
            .position(|c| matches!(c, BackendCall::ReorderChapters(_)))
            .unwrap();
        let first_create = calls
            .iter()
            .position(|c| matches!(c, BackendCall::CreateChapter { .. }))
            .unwrap();
        assert!(batch_at < first_create);

        let created: Vec<(Option<u32>, String)> = calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::CreateChapter { title, order } => Some((*order, title.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            created,
            vec![
                (Some(4), "Chapter 3: E".to_string()),
                (Some(5), "Conclusion: C".to_string())
            ]
        );

        let after = report.chapters.unwrap();
        assert_contiguous_and_titled(&after, &grown.entries);
        for chapter in &before {
            let now = after.iter().find(|c| c.id == chapter.id).unwrap();
            assert_eq!(now.content, chapter.content);
        }
    }

    #[tokio::test]
    async fn test_shrink_deletes_two_highest_after_batch() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["A", "B", "C", "D", "E"]);
        backend.clear_calls();

        let shrunk = outline(&["A", "B", "E"]);
        let report = reconciler(&backend)
            .resync(snapshot.book_id, &shrunk.entries)
            .await
            .unwrap();

        assert_eq!(report.deleted, 2);

        let calls = backend.calls();
        let deleted: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                BackendCall::DeleteChapter(id) => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(deleted, vec![snapshot.chapters[4].id, snapshot.chapters[3].id]);

        let batch_at = calls
            .iter()
            .position(|c| matches!(c, BackendCall::ReorderChapters(_)))
            .unwrap();
        let first_delete = calls
            .iter()
            .position(|c| matches!(c, BackendCall::DeleteChapter(_)))
            .unwrap();
        assert!(batch_at < first_delete);

        let after = report.chapters.unwrap();
        assert_contiguous_and_titled(&after, &shrunk.entries);
        assert_eq!(after[2].content, snapshot.chapters[2].content);
    }

    #[tokio::test]
    async fn test_empty_outline_deletes_all_chapters() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["A", "B"]);

        let report = reconciler(&backend)
            .resync(snapshot.book_id, &[])
            .await
            .unwrap();

        assert_eq!(report.deleted, 2);
        assert!(report.chapters.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_failure_stops_structural_changes() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["A", "B"]);
        backend.fail_next(BackendOp::Reorder, GatewayError::from_errno(500, "boom"));
        backend.clear_calls();

        let grown = outline(&["A", "B", "C"]);
        let err = reconciler(&backend)
            .resync(snapshot.book_id, &grown.entries)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::BatchRejected(_)));
        assert!(!backend
            .calls()
            .iter()
            .any(|c| matches!(c, BackendCall::CreateChapter { .. })));
        assert_eq!(backend.view(snapshot.book_id).unwrap().chapters.len(), 2);
    }

    #[tokio::test]
    async fn test_single_create_failure_is_skipped() {
        let backend = Arc::new(FakeBookBackend::new());
        let snapshot = seeded(&backend, &["A", "B"]);
        backend.fail_next(BackendOp::Create, GatewayError::from_errno(409, "taken"));

        let grown = outline(&["A", "B", "C", "D"]);
        let report = reconciler(&backend)
            .resync(snapshot.book_id, &grown.entries)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.skipped.len(), 1);
        assert!(!report.warnings.is_empty());
    }
}
