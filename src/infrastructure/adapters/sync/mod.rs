//! Sync Adapters - 书籍同步边界的实现

mod fake_book_backend;
mod http_book_client;
mod repository_chapter_sync;

pub use fake_book_backend::{BackendCall, BackendOp, FakeBookBackend};
pub use http_book_client::{HttpBookClient, HttpBookClientConfig};
pub use repository_chapter_sync::RepositoryChapterSync;
