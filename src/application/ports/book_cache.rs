//! Book Cache Port - 乐观缓存
//!
//! UI 读取的本地视图。每次变更先同步写入缓存，再发起网络调用。
//! 每个书籍维护:
//! - current: 当前（可能尚未确认的）快照
//! - last_confirmed: 最近一次被服务端确认的快照，拒绝时回退到它
//! - state: pending → confirmed | rejected

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::book::{BookError, BookId, BookSnapshot, Chapter, Mutation};

/// Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Book not loaded: {0}")]
    NotLoaded(BookId),

    #[error(transparent)]
    Mutation(#[from] BookError),
}

/// 变更生命周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MutationState {
    /// 与服务端一致，无未决变更
    Idle,
    /// 仅本地生效，等待服务端确认
    Pending { version: u64 },
    /// 服务端已确认
    Confirmed { version: u64 },
    /// 服务端拒绝，已回退
    Rejected { version: u64 },
}

impl MutationState {
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending { .. })
    }
}

/// 一次变更的最终结果（调用方总能拿到结果，不会得到让缓存处于未定义状态的错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    /// 服务端已确认
    Confirmed,
    /// 瞬时冲突，保留乐观视图，等待后续重同步自愈
    KeptOptimistic,
    /// 硬失败，已回退到服务端数据或最近确认的快照
    Reverted,
}

/// 单次变更函数
pub type MutateFn<'a> = Box<dyn FnOnce(&BookSnapshot) -> Result<Mutation, BookError> + Send + 'a>;

/// Book Cache Port
pub trait BookCachePort: Send + Sync {
    /// 以服务端数据初始化（current = last_confirmed）
    fn seed(&self, snapshot: BookSnapshot);

    /// 当前快照
    fn current(&self, book_id: BookId) -> Option<BookSnapshot>;

    /// 最近确认的快照
    fn last_confirmed(&self, book_id: BookId) -> Option<BookSnapshot>;

    /// 变更状态
    fn state(&self, book_id: BookId) -> Option<MutationState>;

    /// 唯一的变更入口: 在当前快照上执行变更并立即替换，状态转为 pending
    fn apply(&self, book_id: BookId, mutate: MutateFn<'_>) -> Result<Mutation, CacheError>;

    /// 确认 version 对应的变更；可选地用服务端章节替换本地章节
    ///
    /// 如果之后已有更新的本地变更，则只记录日志并返回 false。
    fn confirm(&self, book_id: BookId, version: u64, chapters: Option<Vec<Chapter>>) -> bool;

    /// 回退到最近确认的快照
    fn rollback(&self, book_id: BookId, version: u64) -> Option<BookSnapshot>;

    /// 以服务端数据覆盖本地视图（丢弃乐观猜测）
    fn revalidate(&self, book_id: BookId, version: u64, server: BookSnapshot) -> BookSnapshot;
}
