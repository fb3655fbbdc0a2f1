//! SQLite Persistence - SQLite 数据库持久化实现

mod book_repo;
mod chapter_repo;
mod database;
mod outline_repo;

pub use book_repo::SqliteBookRepository;
pub use chapter_repo::SqliteChapterRepository;
pub use database::*;
pub use outline_repo::SqliteOutlineRepository;
