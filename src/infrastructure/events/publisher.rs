//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现。每个事件同时发往全局通道和该书籍的通道。

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// 书籍事件类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all_fields = "camelCase")]
pub enum BookEvent {
    /// 书籍创建
    BookCreated { book_id: Uuid, title: String },
    /// 书籍删除（大纲和章节一并删除）
    BookDeleted { book_id: Uuid },
    /// 章节批量重排/改标题
    ChaptersReordered { book_id: Uuid, count: usize },
    /// 章节创建
    ChapterCreated {
        book_id: Uuid,
        chapter_id: Uuid,
        order: u32,
    },
    /// 章节正文更新
    ChapterUpdated {
        book_id: Uuid,
        chapter_id: Uuid,
        word_count: u32,
    },
    /// 章节删除
    ChapterDeleted { book_id: Uuid, chapter_id: Uuid },
    /// 大纲保存
    OutlineSaved {
        book_id: Uuid,
        entries: usize,
        chapters_synced: bool,
    },
    /// 单个大纲条目更新
    OutlineEntryUpdated { book_id: Uuid, entry_id: Uuid },
}

impl BookEvent {
    pub fn book_id(&self) -> Uuid {
        match self {
            BookEvent::BookCreated { book_id, .. }
            | BookEvent::BookDeleted { book_id }
            | BookEvent::ChaptersReordered { book_id, .. }
            | BookEvent::ChapterCreated { book_id, .. }
            | BookEvent::ChapterUpdated { book_id, .. }
            | BookEvent::ChapterDeleted { book_id, .. }
            | BookEvent::OutlineSaved { book_id, .. }
            | BookEvent::OutlineEntryUpdated { book_id, .. } => *book_id,
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// book_id -> broadcast sender
    book_channels: DashMap<Uuid, broadcast::Sender<BookEvent>>,
    /// 全局广播通道
    global_channel: broadcast::Sender<BookEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(100);
        Self {
            book_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<BookEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅单本书的事件，通道不存在时创建
    pub fn subscribe_book(&self, book_id: Uuid) -> broadcast::Receiver<BookEvent> {
        self.book_channels
            .entry(book_id)
            .or_insert_with(|| broadcast::channel(100).0)
            .subscribe()
    }

    /// 没有订阅者时移除书籍通道
    pub fn release_book(&self, book_id: Uuid) {
        self.book_channels
            .remove_if(&book_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 发布事件
    pub fn publish(&self, event: BookEvent) {
        let book_id = event.book_id();

        if let Some(sender) = self.book_channels.get(&book_id) {
            if let Err(e) = sender.send(event.clone()) {
                tracing::debug!(
                    book_id = %book_id,
                    error = %e,
                    "Failed to publish book event (no receivers)"
                );
            }
        }

        if let BookEvent::BookDeleted { .. } = event {
            self.book_channels.remove(&book_id);
        }

        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                book_id = %book_id,
                error = %e,
                "Failed to publish global event (no receivers)"
            );
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_reaches_book_and_global_subscribers() {
        let publisher = EventPublisher::new();
        let book_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        let mut global = publisher.subscribe_global();
        let mut book = publisher.subscribe_book(book_id);
        let mut other = publisher.subscribe_book(other_id);

        publisher.publish(BookEvent::ChaptersReordered { book_id, count: 3 });

        assert_eq!(
            book.recv().await.unwrap(),
            BookEvent::ChaptersReordered { book_id, count: 3 }
        );
        assert_eq!(global.recv().await.unwrap().book_id(), book_id);
        assert!(other.try_recv().is_err());
    }

    #[test]
    fn test_event_wire_format() {
        let book_id = Uuid::nil();
        let json = serde_json::to_value(BookEvent::OutlineSaved {
            book_id,
            entries: 2,
            chapters_synced: true,
        })
        .unwrap();

        assert_eq!(json["event"], "OutlineSaved");
        assert_eq!(json["data"]["entries"], 2);
        assert_eq!(json["data"]["chaptersSynced"], true);
    }
}
