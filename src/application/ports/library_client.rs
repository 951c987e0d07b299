//! Library Client Port - 曲库管理器
//!
//! 列出曲库中的艺术家、添加新艺术家

use async_trait::async_trait;

use super::ProviderError;

/// 添加艺术家时的曲库选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddArtistOptions {
    pub root_folder_path: String,
    pub quality_profile_id: i64,
    pub metadata_profile_id: i64,
    pub monitored: bool,
    /// 监控策略（all / future / missing / ...），空表示使用服务端默认
    pub monitor: Option<String>,
    /// 新条目监控策略（all / none / new）
    pub monitor_new_items: Option<String>,
    pub albums_to_monitor: Vec<String>,
    pub search_for_missing_albums: bool,
    /// 只记录日志，不实际发送请求
    pub dry_run: bool,
}

/// 添加请求
#[derive(Debug, Clone, PartialEq)]
pub struct AddArtistRequest {
    pub name: String,
    /// MusicBrainz artist id
    pub foreign_artist_id: String,
    pub options: AddArtistOptions,
}

/// 添加结果
#[derive(Debug, Clone, PartialEq)]
pub enum AddArtistOutcome {
    Added,
    AlreadyPresent,
    InvalidPath,
    Failed(String),
}

/// Library Client Port
#[async_trait]
pub trait LibraryClientPort: Send + Sync {
    /// 列出曲库中的全部艺术家名称
    async fn list_artists(&self) -> Result<Vec<String>, ProviderError>;

    /// 添加艺术家
    async fn add_artist(&self, request: AddArtistRequest) -> Result<AddArtistOutcome, ProviderError>;
}
