//! Book Context - 书籍限界上下文
//!
//! 职责:
//! - 书籍聚合与本地快照
//! - 大纲条目、章节实体
//! - 本地变更与大纲/章节对齐规划

mod aggregate;
mod entities;
mod errors;
mod value_objects;

pub mod mutations;
pub mod reconcile;

pub use aggregate::{check_contiguity, Book, BookSnapshot};
pub use entities::{sort_by_order, Chapter, Outline, OutlineEntry};
pub use errors::BookError;
pub use mutations::{EntryDraft, Mutation, ReorderPayload, SideEffect};
pub use reconcile::{ChapterUpdate, NewChapter, ReconcilePlan};
pub use value_objects::{BookId, ChapterId, OutlineEntryId, Title};
