//! Artist Catalog Ports - 关键字搜索与艺术家标识解析

use async_trait::async_trait;

use super::ProviderError;

/// 关键字搜索
#[async_trait]
pub trait KeywordSearchPort: Send + Sync {
    /// 按原始查询字符串搜索艺术家名称
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError>;
}

/// 目录中的艺术家条目
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

/// 艺术家标识查询（添加到曲库时需要外部 id）
#[async_trait]
pub trait ArtistIdentityPort: Send + Sync {
    /// 按名称查询候选条目，按相关性排序
    async fn lookup(&self, name: &str) -> Result<Vec<CatalogArtist>, ProviderError>;
}
