//! Book Context - Errors

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("无效的标题: {0}")]
    InvalidTitle(String),

    #[error("位置越界: {index} (共 {len} 项)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("章节不存在: {0}")]
    ChapterNotFound(String),

    #[error("章节顺序不连续: {0:?}")]
    BrokenOrdering(Vec<u32>),
}
