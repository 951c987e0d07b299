//! Metadata Provider Ports - 艺术家描述信息与封面

use async_trait::async_trait;

use super::ProviderError;

/// 艺术家描述信息
///
/// 子查询（标签、计数）各自独立失败，失败时对应字段为 None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtistMetadata {
    /// 上游返回的规范显示名称
    pub name: String,
    pub tags: Option<Vec<String>>,
    pub listener_count: Option<u64>,
    pub play_count: Option<u64>,
    pub image_url: Option<String>,
}

/// 艺术家简介
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistBiography {
    pub name: String,
    pub biography: Option<String>,
}

#[async_trait]
pub trait MetadataProviderPort: Send + Sync {
    /// 查询艺术家描述信息，上游不存在该艺术家时返回 `ProviderError::NotFound`
    async fn describe(&self, name: &str) -> Result<ArtistMetadata, ProviderError>;

    /// 按名称搜索艺术家（返回上游名称）
    async fn search_artists(&self, name: &str) -> Result<Vec<String>, ProviderError>;

    /// 获取简介
    async fn biography(&self, name: &str) -> Result<ArtistBiography, ProviderError>;

    /// 热门曲目名称
    async fn top_tracks(&self, name: &str, limit: usize) -> Result<Vec<String>, ProviderError>;
}

/// 封面查询
#[async_trait]
pub trait ArtworkProviderPort: Send + Sync {
    async fn image_url(&self, name: &str) -> Result<Option<String>, ProviderError>;
}
