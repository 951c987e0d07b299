//! Artist Query Handlers - 简介与试听

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::application::discovery::{Attempt, FallbackChain};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AudioPreview, MetadataProviderPort, PreviewProviderPort, ProviderError,
};
use crate::application::queries::{PrehearArtist, PreviewArtist};
use crate::domain::name_normalizer::{fuzzy_ratio, is_fuzzy_match};

/// 试听时参考的热门曲目数量
const PREHEAR_TOP_TRACKS: usize = 5;

// ============================================================================
// Response DTOs
// ============================================================================

/// 艺术家简介响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistPreviewResponse {
    pub name: String,
    pub biography: Option<String>,
    /// 没有简介时给用户的提示
    pub message: Option<String>,
}

/// 试听响应
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrehearResponse {
    pub artist_name: String,
    pub preview: Option<AudioPreview>,
}

// ============================================================================
// PreviewArtist
// ============================================================================

/// PreviewArtist Handler - 取最佳模糊匹配的简介
pub struct PreviewArtistHandler {
    metadata: Arc<dyn MetadataProviderPort>,
}

impl PreviewArtistHandler {
    pub fn new(metadata: Arc<dyn MetadataProviderPort>) -> Self {
        Self { metadata }
    }

    pub async fn handle(&self, query: PreviewArtist) -> Result<ArtistPreviewResponse, ApplicationError> {
        let wanted = query.artist_name.trim();
        if wanted.is_empty() {
            return Err(ApplicationError::validation("artist name is empty"));
        }

        let candidates = self
            .metadata
            .search_artists(wanted)
            .await
            .map_err(|e| ApplicationError::ExternalServiceError(e.to_string()))?;

        let best = candidates
            .iter()
            .filter(|name| is_fuzzy_match(name, wanted))
            .max_by(|a, b| fuzzy_ratio(a, wanted).total_cmp(&fuzzy_ratio(b, wanted)));

        let Some(best) = best else {
            return Ok(ArtistPreviewResponse {
                name: wanted.to_string(),
                biography: None,
                message: Some(format!("No match found for {}.", wanted)),
            });
        };

        let bio = self
            .metadata
            .biography(best)
            .await
            .map_err(|e| ApplicationError::ExternalServiceError(e.to_string()))?;

        let biography = bio.biography.filter(|b| !b.trim().is_empty());
        let message = biography
            .is_none()
            .then(|| format!("No biography available for {}.", bio.name));

        Ok(ArtistPreviewResponse {
            name: bio.name,
            biography,
            message,
        })
    }
}

// ============================================================================
// PrehearArtist
// ============================================================================

/// PrehearArtist Handler
///
/// 按提供方顺序回退：每个提供方先逐个尝试热门曲目，
/// 支持按艺术家查询的提供方最后再按艺术家名称尝试一次
pub struct PrehearHandler {
    metadata: Arc<dyn MetadataProviderPort>,
    providers: Vec<Arc<dyn PreviewProviderPort>>,
}

impl PrehearHandler {
    pub fn new(
        metadata: Arc<dyn MetadataProviderPort>,
        providers: Vec<Arc<dyn PreviewProviderPort>>,
    ) -> Self {
        Self {
            metadata,
            providers,
        }
    }

    pub async fn handle(&self, query: PrehearArtist) -> Result<PrehearResponse, ApplicationError> {
        let artist = query.artist_name.trim().to_string();
        if artist.is_empty() {
            return Err(ApplicationError::validation("artist name is empty"));
        }

        let tracks = match self.metadata.top_tracks(&artist, PREHEAR_TOP_TRACKS).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(artist = %artist, error = %e, "Top tracks lookup failed");
                Vec::new()
            }
        };

        let mut chain = FallbackChain::new();
        for provider in &self.providers {
            for track in &tracks {
                chain = chain.then(PreviewAttempt {
                    provider: provider.clone(),
                    artist: artist.clone(),
                    track: Some(track.clone()),
                });
            }
            if provider.supports_artist_only() {
                chain = chain.then(PreviewAttempt {
                    provider: provider.clone(),
                    artist: artist.clone(),
                    track: None,
                });
            }
        }

        let preview = match chain.first_present().await {
            Ok(preview) => preview,
            Err(e) => {
                tracing::warn!(artist = %artist, error = %e, "Every preview provider failed");
                None
            }
        };

        Ok(PrehearResponse {
            artist_name: artist,
            preview,
        })
    }
}

struct PreviewAttempt {
    provider: Arc<dyn PreviewProviderPort>,
    artist: String,
    track: Option<String>,
}

#[async_trait]
impl Attempt<AudioPreview> for PreviewAttempt {
    fn label(&self) -> String {
        match &self.track {
            Some(track) => format!("{}:{}", self.provider.name(), track),
            None => format!("{}:artist", self.provider.name()),
        }
    }

    async fn run(&self) -> Result<Option<AudioPreview>, ProviderError> {
        self.provider
            .find_preview(&self.artist, self.track.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{FakeMetadata, FakePreview};

    #[tokio::test]
    async fn test_preview_picks_best_fuzzy_match() {
        let metadata = FakeMetadata::new()
            .with_search("sigur ros", &["Sigur Rós", "Sigur Rós & Friends", "Jónsi"])
            .with_biography("Sigur Rós", "Icelandic post-rock band.");
        let handler = PreviewArtistHandler::new(Arc::new(metadata));

        let response = handler
            .handle(PreviewArtist {
                artist_name: "sigur ros".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.name, "Sigur Rós");
        assert_eq!(response.biography.as_deref(), Some("Icelandic post-rock band."));
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_preview_without_match() {
        let metadata = FakeMetadata::new().with_search("xyz", &["Completely Else"]);
        let handler = PreviewArtistHandler::new(Arc::new(metadata));

        let response = handler
            .handle(PreviewArtist {
                artist_name: "xyz".to_string(),
            })
            .await
            .unwrap();

        assert!(response.biography.is_none());
        assert_eq!(response.message.as_deref(), Some("No match found for xyz."));
    }

    #[tokio::test]
    async fn test_preview_without_biography() {
        let metadata = FakeMetadata::new().with_search("Air", &["Air"]);
        let handler = PreviewArtistHandler::new(Arc::new(metadata));

        let response = handler
            .handle(PreviewArtist {
                artist_name: "Air".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.message.as_deref(), Some("No biography available for Air."));
    }

    #[tokio::test]
    async fn test_prehear_falls_back_across_providers() {
        let metadata = FakeMetadata::new().with_top_tracks("Air", &["Sexy Boy", "La Femme d'Argent"]);
        let youtube = Arc::new(FakePreview::new("youtube", false).failing(ProviderError::Timeout));
        let itunes = Arc::new(FakePreview::new("itunes", true).with_track("Air", "La Femme d'Argent"));
        let handler = PrehearHandler::new(Arc::new(metadata), vec![youtube.clone(), itunes.clone()]);

        let response = handler
            .handle(PrehearArtist {
                artist_name: "Air".to_string(),
            })
            .await
            .unwrap();

        let preview = response.preview.unwrap();
        assert_eq!(preview.source, "itunes");
        assert_eq!(preview.track, "La Femme d'Argent");
        assert_eq!(youtube.calls().len(), 2);
        assert_eq!(
            itunes.calls(),
            vec![Some("Sexy Boy".to_string()), Some("La Femme d'Argent".to_string())]
        );
    }

    #[tokio::test]
    async fn test_prehear_artist_only_fallback() {
        let itunes = Arc::new(FakePreview::new("itunes", true).with_artist_preview("Moby", "Porcelain"));
        let handler = PrehearHandler::new(Arc::new(FakeMetadata::new()), vec![itunes.clone()]);

        let response = handler
            .handle(PrehearArtist {
                artist_name: "Moby".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.preview.unwrap().track, "Porcelain");
        assert_eq!(itunes.calls(), vec![None]);
    }

    #[tokio::test]
    async fn test_prehear_nothing_found() {
        let handler = PrehearHandler::new(
            Arc::new(FakeMetadata::new().with_top_tracks("Ghost", &["Boo"])),
            vec![Arc::new(FakePreview::new("youtube", false))],
        );

        let response = handler
            .handle(PrehearArtist {
                artist_name: "Ghost".to_string(),
            })
            .await
            .unwrap();
        assert!(response.preview.is_none());
    }
}
