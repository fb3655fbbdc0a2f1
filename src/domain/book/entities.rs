//! Book Context - Entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChapterId, OutlineEntryId};
use crate::domain::text::word_count;
use crate::domain::title;

/// 大纲条目（目录中的一行）
///
/// 不变量:
/// - position 即在 Outline.entries 中的下标，不单独存储
/// - full_title 总是可由 (position, total, custom_title) 推导
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineEntry {
    pub id: OutlineEntryId,
    /// 派生标题（前缀 + 自定义标题）
    pub full_title: String,
    /// 用户输入的自定义标题
    pub custom_title: String,
    pub description: String,
    pub key_points: Vec<String>,
}

impl OutlineEntry {
    /// 创建新条目，完整标题在插入大纲后统一重算
    pub fn new(
        custom_title: impl Into<String>,
        description: impl Into<String>,
        key_points: Vec<String>,
    ) -> Self {
        let custom_title = custom_title.into().trim().to_string();
        Self {
            id: OutlineEntryId::new(),
            full_title: custom_title.clone(),
            custom_title,
            description: description.into(),
            key_points,
        }
    }
}

/// 大纲: 有序条目 + 写作建议
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outline {
    pub entries: Vec<OutlineEntry>,
    /// 写作建议，按插入顺序保存
    pub suggestions: Vec<String>,
}

impl Outline {
    pub fn new(entries: Vec<OutlineEntry>, suggestions: Vec<String>) -> Self {
        let mut outline = Self {
            entries,
            suggestions,
        };
        outline.retitle();
        outline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 结构变化后重算全部标题
    pub fn retitle(&mut self) {
        title::retitle(&mut self.entries);
    }

    pub fn position_of(&self, id: OutlineEntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}

/// 章节（独立撰写的正文单元）
///
/// 不变量:
/// - order 从 1 开始，在同一本书内唯一且连续
/// - word_count 由 content 派生
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: ChapterId,
    pub title: String,
    pub content: String,
    pub order: u32,
    pub word_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(title: impl Into<String>, content: impl Into<String>, order: u32) -> Self {
        let content = content.into();
        let now = Utc::now();
        Self {
            id: ChapterId::new(),
            title: title.into(),
            word_count: word_count(&content),
            content,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    /// 替换正文并刷新字数
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.word_count = word_count(&self.content);
        self.updated_at = Utc::now();
    }
}

/// 按 order 升序排列章节
pub fn sort_by_order(chapters: &mut [Chapter]) {
    chapters.sort_by_key(|c| c.order);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outline_new_retitles_entries() {
        let outline = Outline::new(
            vec![
                OutlineEntry::new("Start", "", vec![]),
                OutlineEntry::new("", "", vec![]),
                OutlineEntry::new("End", "", vec![]),
            ],
            vec![],
        );
        assert_eq!(outline.entries[0].full_title, "Introduction: Start");
        assert_eq!(outline.entries[1].full_title, "Chapter 1: New Chapter");
        assert_eq!(outline.entries[2].full_title, "Conclusion: End");
    }

    #[test]
    fn test_chapter_word_count_is_derived() {
        let mut chapter = Chapter::new("Introduction: X", "<p>one two</p>", 1);
        assert_eq!(chapter.word_count, 2);
        chapter.set_content("<p>one two three</p>");
        assert_eq!(chapter.word_count, 3);
    }
}
