//! Memory Layer - In-Memory State Management
//!
//! 会话注册表与进程级曲库快照

mod library_cache;
mod session_manager;

pub use library_cache::InMemoryLibraryCache;
pub use session_manager::InMemorySessionManager;
