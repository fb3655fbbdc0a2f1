//! Book Context - Aggregate Root

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::sort_by_order;
use super::{BookError, BookId, Chapter, Outline, Title};

/// Book 聚合根
///
/// 拥有一个 Outline 和一组有序 Chapter；删除时级联删除二者。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    id: BookId,
    title: Title,
    genre: Option<String>,
    target_audience: Option<String>,
    instructions: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(title: Title) -> Self {
        let now = Utc::now();
        Self {
            id: BookId::new(),
            title,
            genre: None,
            target_audience: None,
            instructions: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_details(
        mut self,
        genre: Option<String>,
        target_audience: Option<String>,
        instructions: Option<String>,
    ) -> Self {
        self.genre = genre;
        self.target_audience = target_audience;
        self.instructions = instructions;
        self
    }

    // Getters
    pub fn id(&self) -> BookId {
        self.id
    }

    pub fn title(&self) -> &Title {
        &self.title
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }

    pub fn target_audience(&self) -> Option<&str> {
        self.target_audience.as_deref()
    }

    pub fn instructions(&self) -> Option<&str> {
        self.instructions.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// 书籍的本地视图快照（UI 读取的内容）
///
/// version 每次本地变更递增，用于把网络结果与产生它的变更对应起来。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSnapshot {
    pub book_id: BookId,
    pub version: u64,
    pub outline: Outline,
    pub chapters: Vec<Chapter>,
}

impl BookSnapshot {
    pub fn new(book_id: BookId, outline: Outline, mut chapters: Vec<Chapter>) -> Self {
        sort_by_order(&mut chapters);
        Self {
            book_id,
            version: 0,
            outline,
            chapters,
        }
    }

    /// 检查章节 order 恰为 {1..N}
    pub fn check_contiguity(&self) -> Result<(), BookError> {
        check_contiguity(&self.chapters)
    }

    /// 大纲位置对应的章节（order = position + 1）
    pub fn chapter_at(&self, position: usize) -> Option<&Chapter> {
        self.chapters
            .iter()
            .find(|c| c.order as usize == position + 1)
    }
}

/// 检查章节 order 无重复、无空洞
pub fn check_contiguity(chapters: &[Chapter]) -> Result<(), BookError> {
    let mut orders: Vec<u32> = chapters.iter().map(|c| c.order).collect();
    orders.sort_unstable();
    for (index, order) in orders.iter().enumerate() {
        if *order as usize != index + 1 {
            return Err(BookError::BrokenOrdering(orders));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sorts_chapters() {
        let snapshot = BookSnapshot::new(
            BookId::new(),
            Outline::default(),
            vec![
                Chapter::new("b", "", 2),
                Chapter::new("a", "", 1),
            ],
        );
        assert_eq!(snapshot.chapters[0].title, "a");
        assert_eq!(snapshot.chapter_at(1).map(|c| c.title.as_str()), Some("b"));
        assert!(snapshot.check_contiguity().is_ok());
    }

    #[test]
    fn test_contiguity_detects_gaps_and_duplicates() {
        let gap = vec![Chapter::new("a", "", 1), Chapter::new("b", "", 3)];
        assert!(check_contiguity(&gap).is_err());

        let dup = vec![Chapter::new("a", "", 1), Chapter::new("b", "", 1)];
        assert!(check_contiguity(&dup).is_err());

        assert!(check_contiguity(&[]).is_ok());
    }

    #[test]
    fn test_book_details() {
        let book = Book::new(Title::new("Sea Stories").unwrap()).with_details(
            Some("Adventure".to_string()),
            None,
            Some("Keep it short".to_string()),
        );
        assert_eq!(book.genre(), Some("Adventure"));
        assert_eq!(book.target_audience(), None);
        assert_eq!(book.instructions(), Some("Keep it short"));
    }
}
