//! Preview Provider Port - 试听片段

use async_trait::async_trait;
use serde::Serialize;

use super::ProviderError;

/// 试听结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioPreview {
    pub source: String,
    pub artist: String,
    pub track: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

#[async_trait]
pub trait PreviewProviderPort: Send + Sync {
    fn name(&self) -> &str;

    /// 是否支持只按艺术家（不指定曲目）查询
    fn supports_artist_only(&self) -> bool {
        false
    }

    async fn find_preview(
        &self,
        artist: &str,
        track: Option<&str>,
    ) -> Result<Option<AudioPreview>, ProviderError>;
}
