//! Book Queries

use uuid::Uuid;

/// 获取书籍详情（大纲 + 建议 + 章节）
#[derive(Debug, Clone)]
pub struct GetBook {
    pub book_id: Uuid,
}

/// 列出所有书籍
#[derive(Debug, Clone)]
pub struct ListBooks;
