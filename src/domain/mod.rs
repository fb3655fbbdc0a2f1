//! Domain Layer - 领域层
//!
//! - Book Context: 书籍、大纲、章节
//! - 标题推导与正文工具为共享的纯函数

pub mod book;
pub mod text;
pub mod title;

pub use text::{chapter_template, strip_markup, word_count};
pub use title::{custom_title_of, extract_custom_title, full_title, prefix, retitle, DEFAULT_CUSTOM_TITLE};
