//! Chapter Commands

use uuid::Uuid;

/// 批量重排中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterOrderUpdate {
    pub chapter_id: Uuid,
    pub order: u32,
    pub title: String,
}

/// 原子批量重排/改标题命令
#[derive(Debug, Clone)]
pub struct ReorderChapters {
    pub book_id: Uuid,
    pub updates: Vec<ChapterOrderUpdate>,
}

/// 新建章节命令
#[derive(Debug, Clone)]
pub struct CreateChapter {
    pub book_id: Uuid,
    pub title: String,
    pub content: String,
    /// 为空时追加到末尾
    pub order: Option<u32>,
}

/// 删除章节命令
#[derive(Debug, Clone)]
pub struct DeleteChapter {
    pub book_id: Uuid,
    pub chapter_id: Uuid,
}

/// 更新章节正文命令
#[derive(Debug, Clone)]
pub struct UpdateChapterContent {
    pub book_id: Uuid,
    pub chapter_id: Uuid,
    pub content: String,
}
