//! Events - 书籍事件推送

mod publisher;

pub use publisher::{BookEvent, EventPublisher};
