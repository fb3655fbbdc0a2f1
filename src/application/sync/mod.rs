//! 编辑引擎 - 客户端侧的大纲/章节同步
//!
//! - Reconciler: 完整重同步（重排批量 → 新建 → 删除 → 校验）
//! - BookEditor: UI 层的变更入口，负责乐观缓存与失败策略
//! - policy: 失败后的缓存处理（保留乐观视图或以服务端为准）

mod editor;
mod policy;
mod reconciler;

pub use editor::BookEditor;
pub use policy::settle_failure;
pub use reconciler::{Reconciler, ResyncReport};

use thiserror::Error;

use crate::application::ports::{CacheError, GatewayError};

/// 同步错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 读取或单次写入失败
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// 批量重排被拒绝，后续的新建/删除/大纲保存都不会执行
    #[error("Chapter reorder batch rejected: {0}")]
    BatchRejected(GatewayError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl SyncError {
    /// 引起失败的边界错误（本地校验错误没有）
    pub fn gateway(&self) -> Option<&GatewayError> {
        match self {
            SyncError::Gateway(e) | SyncError::BatchRejected(e) => Some(e),
            SyncError::Cache(_) => None,
        }
    }
}
