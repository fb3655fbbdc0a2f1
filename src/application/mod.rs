//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Repository、同步边界、乐观缓存、去抖队列）
//! - commands: CQRS 命令及处理器（服务端写操作）
//! - queries: CQRS 查询及处理器
//! - sync: 编辑引擎（完整重同步、UI 层变更入口）
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod sync;

// Re-exports
pub use commands::{
    // Book commands
    CreateBook,
    DeleteBook,
    // Chapter commands
    ChapterOrderUpdate,
    CreateChapter,
    DeleteChapter,
    ReorderChapters,
    UpdateChapterContent,
    // Outline commands
    OutlineEntryInput,
    PatchOutlineEntry,
    SaveOutline,
    // Handlers
    handlers::{
        CreateBookHandler, CreateChapterHandler, DeleteBookHandler, DeleteChapterHandler,
        PatchOutlineEntryHandler, ReorderChaptersHandler, SaveOutlineHandler,
        SaveOutlineResponse, UpdateChapterContentHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Cache
    BookCachePort,
    CacheError,
    MutationOutcome,
    MutationState,
    // Queue
    ReorderQueuePort,
    // Repositories
    BookRecord,
    BookRepositoryPort,
    ChapterRecord,
    ChapterRepositoryPort,
    OutlineRepositoryPort,
    RepositoryError,
    // Sync boundary
    BookView,
    ChapterSyncPort,
    EntryPatch,
    GatewayError,
    OutlineSave,
    OutlineSyncPort,
};

pub use queries::{
    GetBook,
    ListBooks,
    // Handlers
    handlers::{BookDetails, GetBookHandler, ListBooksHandler},
};

pub use sync::{BookEditor, Reconciler, ResyncReport, SyncError};
