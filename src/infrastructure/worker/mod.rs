//! Background Workers
//!
//! 后台任务处理

mod reorder_coalescer;

pub use reorder_coalescer::{ReorderCoalescer, ReorderCoalescerConfig};
