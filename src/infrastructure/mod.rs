//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod editor;
pub mod events;
pub mod http;
pub mod memory;
pub mod persistence;
pub mod worker;

pub use adapters::{FakeBookBackend, HttpBookClient, HttpBookClientConfig, RepositoryChapterSync};
pub use editor::EditorRuntime;
pub use events::{BookEvent, EventPublisher};
pub use memory::InMemoryBookCache;
pub use worker::{ReorderCoalescer, ReorderCoalescerConfig};
