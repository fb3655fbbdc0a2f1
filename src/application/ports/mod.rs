//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod book_cache;
mod book_sync;
mod reorder_queue;
mod repositories;

pub use book_cache::{BookCachePort, CacheError, MutateFn, MutationOutcome, MutationState};
pub use book_sync::{
    BookView, ChapterSyncPort, EntryPatch, FailureClass, GatewayError, OutlineSave,
    OutlineSyncPort,
};
pub use reorder_queue::ReorderQueuePort;
pub use repositories::{
    BookRecord, BookRepositoryPort, ChapterRecord, ChapterReorderRecord, ChapterRepositoryPort,
    OutlineEntryRecord, OutlineRecord, OutlineRepositoryPort, RepositoryError,
};
