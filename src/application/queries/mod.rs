//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod artist_queries;
mod library_queries;

pub mod handlers;

pub use artist_queries::*;
pub use library_queries::*;
