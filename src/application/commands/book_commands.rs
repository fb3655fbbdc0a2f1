//! Book Commands

use uuid::Uuid;

/// 创建书籍命令
#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub genre: Option<String>,
    pub target_audience: Option<String>,
    pub instructions: Option<String>,
}

/// 删除书籍命令（级联删除大纲和章节）
#[derive(Debug, Clone)]
pub struct DeleteBook {
    pub book_id: Uuid,
}
