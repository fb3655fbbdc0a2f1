//! 本地变更
//!
//! 每个变更函数接收当前快照，返回下一个快照以及需要执行的副作用（网络调用）。
//! 函数本身不做 I/O，副作用由调用方按顺序执行。

use serde::{Deserialize, Serialize};

use super::entities::sort_by_order;
use super::reconcile::{plan_entry_sync, plan_resync, positional_updates, ChapterUpdate, ReconcilePlan};
use super::{BookError, BookSnapshot, Chapter, ChapterId, Outline, OutlineEntry, OutlineEntryId};

/// 去抖后要发送的重排内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderPayload {
    /// 整表的 {id, order, title}
    pub updates: Vec<ChapterUpdate>,
    /// 重排后的完整大纲
    pub outline: Outline,
    /// 章节数与条目数不一致，发送时走完整重同步而不是按位置批量
    #[serde(default)]
    pub full_resync: bool,
}

/// 变更产生的副作用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// 交给去抖队列: 章节批量重排，然后保存大纲（跳过服务端章节同步）
    CoalescedReorder(ReorderPayload),
    /// 完整重同步，然后保存大纲
    Resync,
    /// 只保存大纲（建议列表变化）
    SaveOutline,
    /// 单条目编辑
    PatchEntry { entry_id: OutlineEntryId },
}

/// 变更结果
#[derive(Debug, Clone)]
pub struct Mutation {
    pub next: BookSnapshot,
    pub effects: Vec<SideEffect>,
}

impl Mutation {
    fn new(mut next: BookSnapshot, effects: Vec<SideEffect>) -> Self {
        next.version += 1;
        Self { next, effects }
    }
}

/// 条目编辑内容
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub custom_title: String,
    pub description: String,
    pub key_points: Vec<String>,
}

impl EntryDraft {
    pub fn into_entry(self) -> OutlineEntry {
        OutlineEntry::new(self.custom_title, self.description, self.key_points)
    }
}

fn check_index(index: usize, len: usize) -> Result<(), BookError> {
    if index >= len {
        return Err(BookError::IndexOutOfRange { index, len });
    }
    Ok(())
}

/// 在本地章节上套用对齐计划（新建的章节等服务端返回 id 后才出现）
fn apply_plan_locally(chapters: &mut Vec<Chapter>, plan: &ReconcilePlan) {
    chapters.retain(|c| !plan.deletes.contains(&c.id));
    for update in &plan.updates {
        if let Some(chapter) = chapters.iter_mut().find(|c| c.id == update.id) {
            chapter.order = update.order;
            chapter.title = update.title.clone();
        }
    }
    sort_by_order(chapters);
}

/// 把大纲条目从 from 移到 to
///
/// 本地章节做同样的移动（按身份，正文跟着章节走），随后整表重新编号和改标题。
/// 章节数与条目数不一致时无法按位置镜像，本地按重同步计划对齐，发送时做完整重同步。
pub fn move_entry(snapshot: &BookSnapshot, from: usize, to: usize) -> Result<Mutation, BookError> {
    let len = snapshot.outline.len();
    check_index(from, len)?;
    check_index(to, len)?;

    let mut next = snapshot.clone();
    let entry = next.outline.entries.remove(from);
    next.outline.entries.insert(to, entry);
    next.outline.retitle();

    sort_by_order(&mut next.chapters);
    if next.chapters.len() != len {
        let plan = plan_resync(&next.outline.entries, &next.chapters);
        apply_plan_locally(&mut next.chapters, &plan);

        let payload = ReorderPayload {
            updates: Vec::new(),
            outline: next.outline.clone(),
            full_resync: true,
        };
        return Ok(Mutation::new(next, vec![SideEffect::CoalescedReorder(payload)]));
    }

    let chapter = next.chapters.remove(from);
    next.chapters.insert(to, chapter);

    let updates = positional_updates(&next.outline.entries, &next.chapters);
    for (chapter, update) in next.chapters.iter_mut().zip(&updates) {
        chapter.order = update.order;
        chapter.title = update.title.clone();
    }

    let payload = ReorderPayload {
        updates,
        outline: next.outline.clone(),
        full_resync: false,
    };
    Ok(Mutation::new(next, vec![SideEffect::CoalescedReorder(payload)]))
}

/// 在 at 处插入新条目（at == len 表示追加）
pub fn insert_entry(
    snapshot: &BookSnapshot,
    at: usize,
    draft: EntryDraft,
) -> Result<Mutation, BookError> {
    check_index(at, snapshot.outline.len() + 1)?;

    let mut next = snapshot.clone();
    next.outline.entries.insert(at, draft.into_entry());
    next.outline.retitle();

    let plan = plan_resync(&next.outline.entries, &next.chapters);
    apply_plan_locally(&mut next.chapters, &plan);

    Ok(Mutation::new(next, vec![SideEffect::Resync]))
}

/// 删除 index 处的条目
pub fn remove_entry(snapshot: &BookSnapshot, index: usize) -> Result<Mutation, BookError> {
    check_index(index, snapshot.outline.len())?;

    let mut next = snapshot.clone();
    next.outline.entries.remove(index);
    next.outline.retitle();

    let plan = plan_resync(&next.outline.entries, &next.chapters);
    apply_plan_locally(&mut next.chapters, &plan);

    Ok(Mutation::new(next, vec![SideEffect::Resync]))
}

/// 编辑单个条目，对应位置的章节只改标题
pub fn edit_entry(
    snapshot: &BookSnapshot,
    index: usize,
    draft: EntryDraft,
) -> Result<Mutation, BookError> {
    check_index(index, snapshot.outline.len())?;

    let mut next = snapshot.clone();
    let entry = &mut next.outline.entries[index];
    entry.custom_title = draft.custom_title.trim().to_string();
    entry.description = draft.description;
    entry.key_points = draft.key_points;
    let entry_id = entry.id;
    next.outline.retitle();

    if let Some(update) = plan_entry_sync(&next.outline.entries, index, &next.chapters) {
        if let Some(chapter) = next.chapters.iter_mut().find(|c| c.id == update.id) {
            chapter.title = update.title;
        }
    }

    Ok(Mutation::new(next, vec![SideEffect::PatchEntry { entry_id }]))
}

pub fn add_suggestion(snapshot: &BookSnapshot, text: impl Into<String>) -> Mutation {
    let mut next = snapshot.clone();
    next.outline.suggestions.push(text.into());
    Mutation::new(next, vec![SideEffect::SaveOutline])
}

pub fn edit_suggestion(
    snapshot: &BookSnapshot,
    index: usize,
    text: impl Into<String>,
) -> Result<Mutation, BookError> {
    check_index(index, snapshot.outline.suggestions.len())?;
    let mut next = snapshot.clone();
    next.outline.suggestions[index] = text.into();
    Ok(Mutation::new(next, vec![SideEffect::SaveOutline]))
}

pub fn remove_suggestion(snapshot: &BookSnapshot, index: usize) -> Result<Mutation, BookError> {
    check_index(index, snapshot.outline.suggestions.len())?;
    let mut next = snapshot.clone();
    next.outline.suggestions.remove(index);
    Ok(Mutation::new(next, vec![SideEffect::SaveOutline]))
}

/// 服务端确认删除后，在本地移除章节并把后续章节前移
pub fn remove_chapter(snapshot: &BookSnapshot, chapter_id: ChapterId) -> Result<Mutation, BookError> {
    let mut next = snapshot.clone();
    let removed = next
        .chapters
        .iter()
        .position(|c| c.id == chapter_id)
        .map(|index| next.chapters.remove(index))
        .ok_or_else(|| BookError::ChapterNotFound(chapter_id.to_string()))?;

    for chapter in next.chapters.iter_mut().filter(|c| c.order > removed.order) {
        chapter.order -= 1;
    }
    sort_by_order(&mut next.chapters);

    Ok(Mutation::new(next, Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::book::BookId;

    fn snapshot(titles: &[&str]) -> BookSnapshot {
        let outline = Outline::new(
            titles
                .iter()
                .map(|t| OutlineEntry::new(*t, "", vec![]))
                .collect(),
            vec![],
        );
        let chapters = outline
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| Chapter::new(e.full_title.clone(), format!("<p>{}</p>", titles[i]), i as u32 + 1))
            .collect();
        BookSnapshot::new(BookId::new(), outline, chapters)
    }

    fn custom_titles(snapshot: &BookSnapshot) -> Vec<&str> {
        snapshot
            .outline
            .entries
            .iter()
            .map(|e| e.custom_title.as_str())
            .collect()
    }

    #[test]
    fn test_move_entry_splices_outline_and_chapters() {
        let before = snapshot(&["A", "B", "C", "D"]);
        let mutation = move_entry(&before, 2, 0).unwrap();
        let next = &mutation.next;

        assert_eq!(custom_titles(next), vec!["C", "A", "B", "D"]);
        assert_eq!(next.outline.entries[0].full_title, "Introduction: C");
        assert_eq!(next.outline.entries[1].full_title, "Chapter 1: A");
        assert_eq!(next.outline.entries[2].full_title, "Chapter 2: B");
        assert_eq!(next.outline.entries[3].full_title, "Conclusion: D");

        // 正文跟着章节身份移动
        assert_eq!(next.chapters[0].id, before.chapters[2].id);
        assert_eq!(next.chapters[0].content, "<p>C</p>");
        assert_eq!(next.chapters[0].title, "Introduction: C");
        assert!(next.check_contiguity().is_ok());
        assert_eq!(next.version, before.version + 1);

        match &mutation.effects[..] {
            [SideEffect::CoalescedReorder(payload)] => {
                let ids: Vec<ChapterId> = payload.updates.iter().map(|u| u.id).collect();
                assert_eq!(
                    ids,
                    vec![
                        before.chapters[2].id,
                        before.chapters[0].id,
                        before.chapters[1].id,
                        before.chapters[3].id,
                    ]
                );
                let orders: Vec<u32> = payload.updates.iter().map(|u| u.order).collect();
                assert_eq!(orders, vec![1, 2, 3, 4]);
                assert_eq!(payload.outline, next.outline);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_move_entry_with_missing_chapter_schedules_full_resync() {
        let mut before = snapshot(&["A", "B", "C", "D"]);
        before.chapters.pop();

        let mutation = move_entry(&before, 0, 3).unwrap();
        let next = &mutation.next;

        assert_eq!(custom_titles(next), vec!["B", "C", "D", "A"]);
        assert_eq!(next.chapters.len(), 3);
        assert!(next.check_contiguity().is_ok());
        for (chapter, entry) in next.chapters.iter().zip(&next.outline.entries) {
            assert_eq!(chapter.title, entry.full_title);
        }
        // 正文从不被改写
        for chapter in &next.chapters {
            let original = before.chapters.iter().find(|c| c.id == chapter.id).unwrap();
            assert_eq!(chapter.content, original.content);
        }

        match &mutation.effects[..] {
            [SideEffect::CoalescedReorder(payload)] => {
                assert!(payload.full_resync);
                assert!(payload.updates.is_empty());
                assert_eq!(payload.outline, next.outline);
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_move_entry_with_extra_chapter_schedules_full_resync() {
        let mut before = snapshot(&["A", "B", "C"]);
        before.chapters.push(Chapter::new("Orphan", "<p>extra</p>", 4));

        let mutation = move_entry(&before, 2, 1).unwrap();

        assert_eq!(mutation.next.chapters.len(), 3);
        assert!(mutation.next.chapters.iter().all(|c| c.title != "Orphan"));
        assert!(matches!(
            &mutation.effects[..],
            [SideEffect::CoalescedReorder(p)] if p.full_resync
        ));
    }

    #[test]
    fn test_move_entry_rejects_out_of_range() {
        let before = snapshot(&["A", "B"]);
        assert_eq!(
            move_entry(&before, 0, 2).unwrap_err(),
            BookError::IndexOutOfRange { index: 2, len: 2 }
        );
    }

    #[test]
    fn test_insert_entry_retitles_without_inventing_chapters() {
        let before = snapshot(&["A", "B", "C"]);
        let mutation = insert_entry(
            &before,
            2,
            EntryDraft {
                custom_title: "New".to_string(),
                ..Default::default()
            },
        )
        .unwrap();
        let next = &mutation.next;

        assert_eq!(custom_titles(next), vec!["A", "B", "New", "C"]);
        assert_eq!(next.chapters.len(), 3);
        assert_eq!(next.chapters[2].title, "Chapter 2: New");
        assert_eq!(next.chapters[2].content, "<p>C</p>");
        assert_eq!(mutation.effects, vec![SideEffect::Resync]);
    }

    #[test]
    fn test_remove_entry_drops_trailing_chapter() {
        let before = snapshot(&["A", "B", "C"]);
        let mutation = remove_entry(&before, 1).unwrap();
        let next = &mutation.next;

        assert_eq!(custom_titles(next), vec!["A", "C"]);
        assert_eq!(next.chapters.len(), 2);
        assert_eq!(next.chapters[1].title, "Conclusion: C");
        assert!(next.check_contiguity().is_ok());
    }

    #[test]
    fn test_edit_entry_keeps_content() {
        let before = snapshot(&["A", "B", "C"]);
        let mutation = edit_entry(
            &before,
            1,
            EntryDraft {
                custom_title: "Better B".to_string(),
                description: "desc".to_string(),
                key_points: vec!["k".to_string()],
            },
        )
        .unwrap();
        let next = &mutation.next;

        assert_eq!(next.outline.entries[1].full_title, "Chapter 1: Better B");
        assert_eq!(next.chapters[1].title, "Chapter 1: Better B");
        assert_eq!(next.chapters[1].content, before.chapters[1].content);
        assert_eq!(
            mutation.effects,
            vec![SideEffect::PatchEntry {
                entry_id: before.outline.entries[1].id
            }]
        );
    }

    #[test]
    fn test_suggestion_crud() {
        let before = snapshot(&["A"]);
        let added = add_suggestion(&before, "Show, don't tell").next;
        let added = add_suggestion(&added, "Vary sentence length").next;
        let edited = edit_suggestion(&added, 0, "Show more").unwrap().next;
        let removed = remove_suggestion(&edited, 1).unwrap().next;

        assert_eq!(removed.outline.suggestions, vec!["Show more".to_string()]);
        assert_eq!(removed.version, before.version + 4);
        assert!(remove_suggestion(&removed, 3).is_err());
    }

    #[test]
    fn test_remove_chapter_renumbers_survivors() {
        let before = snapshot(&["A", "B", "C"]);
        let next = remove_chapter(&before, before.chapters[0].id).unwrap().next;

        let orders: Vec<u32> = next.chapters.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2]);
        assert_eq!(next.chapters[0].id, before.chapters[1].id);
    }
}
