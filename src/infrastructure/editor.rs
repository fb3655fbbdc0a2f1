//! Editor Runtime - 客户端编辑引擎的装配
//!
//! 一个运行时持有共享的乐观缓存、书籍服务客户端和重排去抖队列，
//! 可以为多本书打开编辑会话。必须在 tokio 运行时内创建。

use std::sync::Arc;

use crate::application::ports::{
    BookCachePort, ChapterSyncPort, GatewayError, OutlineSyncPort, ReorderQueuePort,
};
use crate::application::sync::{BookEditor, SyncError};
use crate::config::SyncConfig;
use crate::domain::book::BookId;
use crate::infrastructure::adapters::{HttpBookClient, HttpBookClientConfig};
use crate::infrastructure::memory::InMemoryBookCache;
use crate::infrastructure::worker::{ReorderCoalescer, ReorderCoalescerConfig};

pub struct EditorRuntime {
    cache: Arc<dyn BookCachePort>,
    chapters: Arc<dyn ChapterSyncPort>,
    outline: Arc<dyn OutlineSyncPort>,
    queue: Arc<dyn ReorderQueuePort>,
}

impl EditorRuntime {
    /// 按配置连接远端书籍服务
    pub fn from_config(config: &SyncConfig) -> Result<Self, GatewayError> {
        let client = Arc::new(HttpBookClient::new(
            HttpBookClientConfig::new(config.api_base_url.clone())
                .with_timeout(config.request_timeout_secs),
        )?);

        tracing::info!(
            api_base_url = %config.api_base_url,
            debounce_ms = config.debounce_ms,
            "Editor runtime configured"
        );

        Ok(Self::with_backend(
            ReorderCoalescerConfig {
                delay: config.debounce(),
            },
            client,
        ))
    }

    /// 使用任意实现了两个同步端口的后端
    pub fn with_backend<B>(coalescer: ReorderCoalescerConfig, backend: Arc<B>) -> Self
    where
        B: ChapterSyncPort + OutlineSyncPort + 'static,
    {
        let cache: Arc<dyn BookCachePort> = Arc::new(InMemoryBookCache::new());
        let chapters: Arc<dyn ChapterSyncPort> = backend.clone();
        let outline: Arc<dyn OutlineSyncPort> = backend;
        let queue: Arc<dyn ReorderQueuePort> =
            ReorderCoalescer::spawn(coalescer, cache.clone(), chapters.clone(), outline.clone());

        Self {
            cache,
            chapters,
            outline,
            queue,
        }
    }

    /// 打开一本书的编辑会话
    pub async fn open(&self, book_id: BookId) -> Result<BookEditor, SyncError> {
        BookEditor::open(
            book_id,
            self.cache.clone(),
            self.chapters.clone(),
            self.outline.clone(),
            self.queue.clone(),
        )
        .await
    }
}
