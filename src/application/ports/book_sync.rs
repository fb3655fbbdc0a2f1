//! Book Sync Ports - 编辑引擎与书籍存储之间的边界
//!
//! 客户端通过 HTTP 实现，服务端通过仓储直接实现（用于服务端重同步）。
//! 调用结果分为三类:
//! - 成功: 更新本地缓存
//! - 瞬时冲突（404/409）: 记录日志后继续，不回滚乐观视图
//! - 硬失败: 以服务端数据重新校验，丢弃乐观猜测

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::book::{
    BookId, BookSnapshot, Chapter, ChapterId, ChapterUpdate, NewChapter, Outline, OutlineEntryId,
};

/// 边界调用错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rejected ({errno}): {message}")]
    Rejected { errno: i32, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 失败分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 404/409: 并发修改或目标已不存在，保留乐观视图
    Transient,
    /// 其他失败: 需要以服务端数据为准
    Hard,
}

impl GatewayError {
    pub fn class(&self) -> FailureClass {
        match self {
            GatewayError::NotFound(_) | GatewayError::Conflict(_) => FailureClass::Transient,
            _ => FailureClass::Hard,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.class() == FailureClass::Transient
    }

    /// 按 errno 构造错误
    pub fn from_errno(errno: i32, message: impl Into<String>) -> Self {
        let message = message.into();
        match errno {
            404 => GatewayError::NotFound(message),
            409 => GatewayError::Conflict(message),
            _ => GatewayError::Rejected { errno, message },
        }
    }
}

/// 一次完整读取的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub book_id: BookId,
    pub outline: Outline,
    pub chapters: Vec<Chapter>,
}

impl BookView {
    pub fn into_snapshot(self) -> BookSnapshot {
        BookSnapshot::new(self.book_id, self.outline, self.chapters)
    }
}

/// 保存大纲请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSave {
    pub outline: Outline,
    /// 调用方已自行对齐章节，服务端不要再跑重同步
    pub skip_chapter_sync: bool,
}

/// 单条目编辑请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPatch {
    pub entry_id: OutlineEntryId,
    pub title: String,
    pub description: String,
    pub key_points: Vec<String>,
}

/// 章节侧边界操作
#[async_trait]
pub trait ChapterSyncPort: Send + Sync {
    /// 读取大纲与章节
    async fn fetch_book(&self, book_id: BookId) -> Result<BookView, GatewayError>;

    /// 原子批量重排/改标题，要么全部生效要么拒绝
    async fn reorder_chapters(
        &self,
        book_id: BookId,
        updates: &[ChapterUpdate],
    ) -> Result<(), GatewayError>;

    /// 新建章节
    async fn create_chapter(
        &self,
        book_id: BookId,
        chapter: &NewChapter,
    ) -> Result<Chapter, GatewayError>;

    /// 删除章节
    async fn delete_chapter(&self, book_id: BookId, chapter_id: ChapterId)
        -> Result<(), GatewayError>;
}

/// 大纲侧边界操作
#[async_trait]
pub trait OutlineSyncPort: Send + Sync {
    /// 保存完整大纲（条目 + 建议）
    async fn save_outline(&self, book_id: BookId, save: &OutlineSave) -> Result<(), GatewayError>;

    /// 编辑单个条目，服务端会尽力同步对应章节的标题
    async fn patch_outline_entry(
        &self,
        book_id: BookId,
        patch: &EntryPatch,
    ) -> Result<(), GatewayError>;
}
