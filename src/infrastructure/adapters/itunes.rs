//! iTunes Preview - 30 秒试听片段
//!
//! GET {url}/search?term=...&entity=musicTrack&media=music&limit=5

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base, USER_AGENT};
use crate::application::ports::{AudioPreview, PreviewProviderPort, ProviderError};
use crate::config::ItunesConfig;

const SERVICE: &str = "iTunes";

const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ItunesTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesTrack {
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    track_name: Option<String>,
    #[serde(default)]
    artist_name: Option<String>,
}

/// 第一条带试听地址的结果
fn first_preview(
    response: SearchResponse,
    artist: &str,
    track: Option<&str>,
) -> Option<AudioPreview> {
    response.results.into_iter().find_map(|entry| {
        let preview_url = entry.preview_url.filter(|u| !u.is_empty())?;
        Some(AudioPreview {
            source: "itunes".to_string(),
            artist: entry.artist_name.unwrap_or_else(|| artist.to_string()),
            track: entry
                .track_name
                .unwrap_or_else(|| track.unwrap_or(artist).to_string()),
            preview_url: Some(preview_url),
            video_id: None,
        })
    })
}

/// iTunes 试听
pub struct ItunesPreview {
    client: Client,
    base_url: String,
}

impl ItunesPreview {
    pub fn new(config: &ItunesConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(TIMEOUT_SECS, USER_AGENT)?,
            base_url: trim_base(&config.url),
        })
    }
}

#[async_trait]
impl PreviewProviderPort for ItunesPreview {
    fn name(&self) -> &str {
        "itunes"
    }

    fn supports_artist_only(&self) -> bool {
        true
    }

    async fn find_preview(
        &self,
        artist: &str,
        track: Option<&str>,
    ) -> Result<Option<AudioPreview>, ProviderError> {
        let term = match track {
            Some(track) => format!("{} {}", artist, track),
            None => artist.to_string(),
        };
        let response = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("term", term.as_str()),
                ("entity", "musicTrack"),
                ("media", "music"),
                ("limit", "5"),
            ])
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let body: SearchResponse = read_json(SERVICE, response).await?;
        Ok(first_preview(body, artist, track))
    }
}
