//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（曲库、相似艺术家、元数据、事件推送等）
//! - discovery: 推荐会话引擎（种子解析、相似度扩展、补全、分批推送）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod discovery;
pub mod error;
pub mod ports;
pub mod queries;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use commands::{
    // Discovery commands
    CancelDiscovery,
    CancelDiscoveryResponse,
    DiscoveryRequest,
    LoadMoreArtists,
    StartDiscovery,
    // Library commands
    AddArtist,
    AddArtistResponse,
    RefreshLibrary,
    RefreshLibraryResponse,
    RequestArtist,
    RequestArtistResponse,
    // Handlers
    handlers::{
        AddArtistHandler, CancelDiscoveryHandler, LoadMoreHandler, RefreshLibraryHandler,
        RequestArtistHandler, StartDiscoveryHandler,
    },
};

pub use discovery::{DiscoveryEngine, DiscoverySession, RunSummary};

pub use error::ApplicationError;

pub use queries::{
    GetPersonalSources,
    ListLibrary,
    PrehearArtist,
    PreviewArtist,
    // Handlers
    handlers::{
        ArtistPreviewResponse, LibraryResponse, ListLibraryHandler, PersonalSourceState,
        PersonalSourcesHandler, PrehearHandler, PrehearResponse, PreviewArtistHandler,
    },
};
