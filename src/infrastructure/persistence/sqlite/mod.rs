//! SQLite Persistence - SQLite 数据库持久化实现

mod artist_request_repo;
mod database;

pub use artist_request_repo::*;
pub use database::*;
