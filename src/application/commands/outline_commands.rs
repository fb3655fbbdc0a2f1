//! Outline Commands

use uuid::Uuid;

/// 保存大纲时的单个条目
#[derive(Debug, Clone, Default)]
pub struct OutlineEntryInput {
    /// 为空时生成新 id
    pub id: Option<Uuid>,
    /// 完整标题或自定义标题，custom_title 为空时从中提取
    pub title: String,
    pub custom_title: Option<String>,
    pub description: String,
    pub key_points: Vec<String>,
    /// 排序键（从 1 开始），相同时保持请求中的先后
    pub order: u32,
}

/// 保存大纲命令
#[derive(Debug, Clone)]
pub struct SaveOutline {
    pub book_id: Uuid,
    pub entries: Vec<OutlineEntryInput>,
    pub suggestions: Vec<String>,
    /// 调用方已自行对齐章节
    pub skip_chapter_sync: bool,
}

/// 编辑单个大纲条目命令
#[derive(Debug, Clone)]
pub struct PatchOutlineEntry {
    pub book_id: Uuid,
    pub entry_id: Uuid,
    pub title: String,
    pub description: String,
    pub key_points: Vec<String>,
}
