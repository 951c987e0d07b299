//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod artist_handlers;
mod library_handlers;

pub use artist_handlers::*;
pub use library_handlers::*;
