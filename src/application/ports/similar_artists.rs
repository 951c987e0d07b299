//! Similar Artist Provider Port - 相似艺术家图谱

use async_trait::async_trait;

use super::ProviderError;

/// 图谱中的一个邻居
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarArtist {
    pub name: String,
    /// 上游原始相似度，可能缺失或越界
    pub score: Option<f64>,
}

impl SimilarArtist {
    pub fn new(name: impl Into<String>, score: Option<f64>) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

#[async_trait]
pub trait SimilarArtistProviderPort: Send + Sync {
    /// 查询某艺术家的相似艺术家
    async fn neighbors(&self, name: &str) -> Result<Vec<SimilarArtist>, ProviderError>;
}
