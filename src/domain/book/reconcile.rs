//! 大纲与章节的对齐规划
//!
//! 纯函数: 给定期望的大纲顺序和当前章节列表，计算让章节按位置一一对应大纲
//! 所需的最少操作。正文从不出现在更新计划里，只有新建章节才会写入正文。
//!
//! 执行顺序固定为: 重排/改标题批量 → 新建 → 删除（order 高的先删）。

use serde::{Deserialize, Serialize};

use super::{Chapter, ChapterId, OutlineEntry};
use crate::domain::text::chapter_template;
use crate::domain::title;

/// 单个章节的重排/改标题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterUpdate {
    pub id: ChapterId,
    pub order: u32,
    pub title: String,
}

/// 待新建的章节
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapter {
    pub title: String,
    pub content: String,
    /// 为空时追加到末尾
    pub order: Option<u32>,
}

/// 对齐计划
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// 重叠前缀内的全部章节（即使没有变化也包含，批量提交是幂等的）
    pub updates: Vec<ChapterUpdate>,
    pub creates: Vec<NewChapter>,
    /// order 从高到低
    pub deletes: Vec<ChapterId>,
    /// updates 中实际有变化的数量
    pub changed: usize,
}

impl ReconcilePlan {
    /// 章节与大纲已经对齐
    pub fn is_noop(&self) -> bool {
        self.changed == 0 && self.creates.is_empty() && self.deletes.is_empty()
    }
}

/// 大纲位置对应的期望标题（总是现算，不信任条目上缓存的 full_title）
fn expected_title(entries: &[OutlineEntry], position: usize) -> String {
    title::full_title(position, entries.len(), &entries[position].custom_title)
}

fn sorted(chapters: &[Chapter]) -> Vec<&Chapter> {
    let mut sorted: Vec<&Chapter> = chapters.iter().collect();
    sorted.sort_by_key(|c| c.order);
    sorted
}

/// 完整重同步的规划
pub fn plan_resync(entries: &[OutlineEntry], chapters: &[Chapter]) -> ReconcilePlan {
    let chapters = sorted(chapters);
    let overlap = entries.len().min(chapters.len());
    let mut plan = ReconcilePlan::default();

    for (index, chapter) in chapters.iter().take(overlap).enumerate() {
        let update = ChapterUpdate {
            id: chapter.id,
            order: index as u32 + 1,
            title: expected_title(entries, index),
        };
        if chapter.order != update.order || chapter.title != update.title {
            plan.changed += 1;
        }
        plan.updates.push(update);
    }

    for (index, entry) in entries.iter().enumerate().skip(overlap) {
        let title = expected_title(entries, index);
        plan.creates.push(NewChapter {
            content: chapter_template(&title, Some(entry)),
            title,
            order: Some(index as u32 + 1),
        });
    }

    plan.deletes = chapters
        .iter()
        .skip(entries.len())
        .rev()
        .map(|c| c.id)
        .collect();

    plan
}

/// 本地章节已按目标顺序排列时的批量更新（整表，而不仅是被移动的条目）
pub fn positional_updates(entries: &[OutlineEntry], chapters: &[Chapter]) -> Vec<ChapterUpdate> {
    chapters
        .iter()
        .take(entries.len())
        .enumerate()
        .map(|(index, chapter)| ChapterUpdate {
            id: chapter.id,
            order: index as u32 + 1,
            title: expected_title(entries, index),
        })
        .collect()
}

/// 单条目编辑后的章节同步（只改标题，不动正文）
pub fn plan_entry_sync(
    entries: &[OutlineEntry],
    position: usize,
    chapters: &[Chapter],
) -> Option<ChapterUpdate> {
    if position >= entries.len() {
        return None;
    }
    let order = position as u32 + 1;
    chapters
        .iter()
        .find(|c| c.order == order)
        .map(|chapter| ChapterUpdate {
            id: chapter.id,
            order,
            title: expected_title(entries, position),
        })
}

/// 校验章节是否与大纲完全对齐，返回所有不一致的描述
pub fn verify_alignment(entries: &[OutlineEntry], chapters: &[Chapter]) -> Vec<String> {
    let chapters = sorted(chapters);
    let mut mismatches = Vec::new();

    if chapters.len() != entries.len() {
        mismatches.push(format!(
            "chapter count {} does not match outline length {}",
            chapters.len(),
            entries.len()
        ));
    }

    for (index, chapter) in chapters.iter().take(entries.len()).enumerate() {
        let expected_order = index as u32 + 1;
        if chapter.order != expected_order {
            mismatches.push(format!(
                "chapter {} has order {}, expected {}",
                chapter.id, chapter.order, expected_order
            ));
        }
        let expected = expected_title(entries, index);
        if chapter.title != expected {
            mismatches.push(format!(
                "chapter {} has title {:?}, expected {:?}",
                chapter.id, chapter.title, expected
            ));
        }
    }

    mismatches
}
