//! 失败处理策略
//!
//! - 404/409: 并发修改，保留乐观视图，后续重同步会自愈
//! - 其他: 重新读取服务端数据覆盖本地；读取也失败时回退到最近确认的快照

use crate::application::ports::{
    BookCachePort, ChapterSyncPort, FailureClass, GatewayError, MutationOutcome,
};
use crate::domain::book::BookId;

/// 处理一次失败的写入，返回最终结果
pub async fn settle_failure(
    cache: &dyn BookCachePort,
    chapters: &dyn ChapterSyncPort,
    book_id: BookId,
    version: u64,
    error: &GatewayError,
) -> MutationOutcome {
    if error.class() == FailureClass::Transient {
        tracing::warn!(
            book_id = %book_id,
            version = version,
            error = %error,
            "Transient sync conflict, keeping optimistic view"
        );
        return MutationOutcome::KeptOptimistic;
    }

    tracing::error!(
        book_id = %book_id,
        version = version,
        error = %error,
        "Sync write failed, revalidating from server"
    );

    match chapters.fetch_book(book_id).await {
        Ok(view) => {
            cache.revalidate(book_id, version, view.into_snapshot());
        }
        Err(e) => {
            tracing::error!(
                book_id = %book_id,
                error = %e,
                "Revalidation fetch failed, rolling back to last confirmed snapshot"
            );
            cache.rollback(book_id, version);
        }
    }

    MutationOutcome::Reverted
}
