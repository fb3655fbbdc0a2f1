//! Reorder Queue Port - 重排去抖队列
//!
//! 连续的移动操作只发送最后一次的状态（尾部去抖），本地视图在每次移动时同步更新。

use async_trait::async_trait;

use super::book_cache::MutationOutcome;
use crate::domain::book::{BookId, ReorderPayload};

/// Reorder Queue Port
#[async_trait]
pub trait ReorderQueuePort: Send + Sync {
    /// 记录待发送内容，替换之前未发送的内容并重新计时
    fn schedule(&self, book_id: BookId, version: u64, payload: ReorderPayload);

    /// 是否有未发送的内容
    fn has_pending(&self, book_id: BookId) -> bool;

    /// 丢弃未发送的内容
    fn discard(&self, book_id: BookId) -> bool;

    /// 立即发送未发送的内容并等待结果；没有内容时返回 None
    async fn flush_now(&self, book_id: BookId) -> Option<MutationOutcome>;
}
