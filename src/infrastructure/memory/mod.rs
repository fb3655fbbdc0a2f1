//! Memory Layer - In-Memory State Management
//!
//! 实现 BookCache，管理编辑中书籍的乐观视图

mod optimistic_cache;

pub use optimistic_cache::InMemoryBookCache;
