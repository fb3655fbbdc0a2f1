//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::book::{Book, Chapter, ChapterId, Outline, OutlineEntry, OutlineEntryId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Book Repository
// ============================================================================

/// 书籍实体（用于持久化）
#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: Uuid,
    pub title: String,
    pub genre: Option<String>,
    pub target_audience: Option<String>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        Self {
            id: *book.id().as_uuid(),
            title: book.title().as_str().to_string(),
            genre: book.genre().map(str::to_string),
            target_audience: book.target_audience().map(str::to_string),
            instructions: book.instructions().map(str::to_string),
            created_at: book.created_at(),
            updated_at: book.updated_at(),
        }
    }
}

/// Book Repository Port
#[async_trait]
pub trait BookRepositoryPort: Send + Sync {
    /// 保存书籍
    async fn save(&self, book: &BookRecord) -> Result<(), RepositoryError>;

    /// 根据 ID 查找书籍
    async fn find_by_id(&self, id: Uuid) -> Result<Option<BookRecord>, RepositoryError>;

    /// 获取所有书籍
    async fn find_all(&self) -> Result<Vec<BookRecord>, RepositoryError>;

    /// 删除书籍（级联删除大纲、建议和章节）
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

// ============================================================================
// Chapter Repository
// ============================================================================

/// 章节实体（用于持久化）
#[derive(Debug, Clone)]
pub struct ChapterRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    pub title: String,
    pub content: String,
    pub order: u32,
    pub word_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChapterRecord {
    pub fn into_chapter(self) -> Chapter {
        Chapter {
            id: ChapterId::from_uuid(self.id),
            title: self.title,
            content: self.content,
            order: self.order,
            word_count: self.word_count,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// 批量重排中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterReorderRecord {
    pub id: Uuid,
    pub order: u32,
    pub title: String,
}

/// Chapter Repository Port
///
/// 不变量: (book_id, order) 唯一
#[async_trait]
pub trait ChapterRepositoryPort: Send + Sync {
    /// 按 order 升序获取书籍的全部章节
    async fn find_by_book(&self, book_id: Uuid) -> Result<Vec<ChapterRecord>, RepositoryError>;

    /// 查找书籍内的单个章节
    async fn find_by_id(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<Option<ChapterRecord>, RepositoryError>;

    /// 新建章节，order 已被占用时返回 Duplicate
    async fn create(&self, chapter: &ChapterRecord) -> Result<(), RepositoryError>;

    /// 下一个可追加的 order（max + 1）
    async fn next_order(&self, book_id: Uuid) -> Result<u32, RepositoryError>;

    /// 原子地批量重排/改标题，要么全部生效要么全部不生效
    async fn reorder_batch(
        &self,
        book_id: Uuid,
        updates: &[ChapterReorderRecord],
    ) -> Result<(), RepositoryError>;

    /// 只更新标题
    async fn update_title(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
        title: &str,
    ) -> Result<bool, RepositoryError>;

    /// 更新正文和字数
    async fn update_content(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
        content: &str,
        word_count: u32,
    ) -> Result<bool, RepositoryError>;

    /// 删除章节，并在同一事务内把后续章节的 order 前移
    async fn delete_and_renumber(
        &self,
        book_id: Uuid,
        chapter_id: Uuid,
    ) -> Result<bool, RepositoryError>;
}

// ============================================================================
// Outline Repository
// ============================================================================

/// 大纲条目实体（用于持久化）
#[derive(Debug, Clone)]
pub struct OutlineEntryRecord {
    pub id: Uuid,
    pub book_id: Uuid,
    pub position: u32,
    pub full_title: String,
    pub custom_title: String,
    pub description: String,
    pub key_points: Vec<String>,
}

/// 大纲（条目 + 建议）
#[derive(Debug, Clone, Default)]
pub struct OutlineRecord {
    pub entries: Vec<OutlineEntryRecord>,
    pub suggestions: Vec<String>,
}

impl OutlineRecord {
    pub fn from_outline(book_id: Uuid, outline: &Outline) -> Self {
        Self {
            entries: outline
                .entries
                .iter()
                .enumerate()
                .map(|(position, entry)| OutlineEntryRecord {
                    id: *entry.id.as_uuid(),
                    book_id,
                    position: position as u32,
                    full_title: entry.full_title.clone(),
                    custom_title: entry.custom_title.clone(),
                    description: entry.description.clone(),
                    key_points: entry.key_points.clone(),
                })
                .collect(),
            suggestions: outline.suggestions.clone(),
        }
    }

    pub fn into_outline(mut self) -> Outline {
        self.entries.sort_by_key(|e| e.position);
        Outline {
            entries: self
                .entries
                .into_iter()
                .map(|e| OutlineEntry {
                    id: OutlineEntryId::from_uuid(e.id),
                    full_title: e.full_title,
                    custom_title: e.custom_title,
                    description: e.description,
                    key_points: e.key_points,
                })
                .collect(),
            suggestions: self.suggestions,
        }
    }
}

/// Outline Repository Port
#[async_trait]
pub trait OutlineRepositoryPort: Send + Sync {
    /// 获取书籍的大纲，条目按 position 升序
    async fn find_by_book(&self, book_id: Uuid) -> Result<OutlineRecord, RepositoryError>;

    /// 整体替换大纲条目和建议列表
    async fn replace(&self, book_id: Uuid, outline: &OutlineRecord) -> Result<(), RepositoryError>;

    /// 更新单个条目（不改变 position）
    async fn update_entry(&self, entry: &OutlineEntryRecord) -> Result<bool, RepositoryError>;
}
