//! Bookwright - 大纲与章节的协调引擎
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Book Context: 书籍、大纲条目、章节、本地快照与变更
//! - 位置标题推导、重同步规划
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Repositories, ChapterSync/OutlineSync, BookCache, ReorderQueue）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//! - Sync: Reconciler 与 BookEditor
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: 乐观缓存
//! - Worker: 重排去抖队列
//! - Persistence: SQLite 存储
//! - Adapters: HTTP 书籍客户端、进程内同步、测试用后端
//! - Events: 书籍事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
