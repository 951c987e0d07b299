//! 元数据补全
//!
//! 把裸艺术家名称变成展示卡片。标签、计数、封面各自独立失败并回退到默认值；
//! 只有无法解析艺术家本身时才返回 `MissingMetadata`。

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{ArtistMetadata, ArtworkProviderPort, MetadataProviderPort};
use crate::domain::discovery::{
    format_count, ArtistCard, CardStatus, SimilarityScore, PLACEHOLDER_IMAGE_URL, UNKNOWN_GENRE,
};

/// 参与流派摘要的标签数量
const MAX_GENRE_TAGS: usize = 5;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("no metadata for artist: {0}")]
pub struct MissingMetadata(pub String);

pub struct EnrichmentGateway {
    metadata: Arc<dyn MetadataProviderPort>,
    artwork: Option<Arc<dyn ArtworkProviderPort>>,
}

impl EnrichmentGateway {
    pub fn new(metadata: Arc<dyn MetadataProviderPort>) -> Self {
        Self {
            metadata,
            artwork: None,
        }
    }

    pub fn with_artwork(mut self, artwork: Arc<dyn ArtworkProviderPort>) -> Self {
        self.artwork = Some(artwork);
        self
    }

    pub async fn enrich(
        &self,
        name: &str,
        score: Option<SimilarityScore>,
    ) -> Result<ArtistCard, MissingMetadata> {
        let metadata = match self.metadata.describe(name).await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(artist = %name, error = %e, "Artist metadata lookup failed");
                return Err(MissingMetadata(name.to_string()));
            }
        };

        let image_url = self.image_for(name, &metadata).await;

        Ok(ArtistCard {
            name: name.to_string(),
            genre: genre_summary(metadata.tags.as_deref()),
            image_url,
            popularity: format!("Play Count: {}", format_count(metadata.play_count.unwrap_or(0))),
            listeners: format!(
                "Listeners: {}",
                format_count(metadata.listener_count.unwrap_or(0))
            ),
            similarity_score: score.map(|s| s.value()),
            similarity: score.map(|s| s.label()),
            status: CardStatus::NotRequested,
        })
    }

    /// 封面：专用封面源 -> 元数据自带图片 -> 占位图
    async fn image_for(&self, name: &str, metadata: &ArtistMetadata) -> String {
        if let Some(artwork) = &self.artwork {
            match artwork.image_url(name).await {
                Ok(Some(url)) if !url.is_empty() => return url,
                Ok(_) => {}
                Err(e) => tracing::debug!(artist = %name, error = %e, "Artwork lookup failed"),
            }
        }

        metadata
            .image_url
            .clone()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_string())
    }
}

/// 前 5 个标签，首字母大写，逗号连接
fn genre_summary(tags: Option<&[String]>) -> String {
    let tags: Vec<String> = tags
        .unwrap_or_default()
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .take(MAX_GENRE_TAGS)
        .map(title_case)
        .collect();

    if tags.is_empty() {
        UNKNOWN_GENRE.to_string()
    } else {
        tags.join(", ")
    }
}

fn title_case(tag: &str) -> String {
    tag.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
