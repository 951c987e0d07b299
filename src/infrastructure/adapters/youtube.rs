//! YouTube Preview - 按 "艺术家 曲目" 搜索视频
//!
//! GET https://www.googleapis.com/youtube/v3/search?part=snippet&type=video&maxResults=1

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, read_json, USER_AGENT};
use crate::application::ports::{AudioPreview, PreviewProviderPort, ProviderError};
use crate::config::YoutubeConfig;

const SERVICE: &str = "YouTube";

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

const TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

fn first_video(response: SearchResponse) -> Option<String> {
    response
        .items
        .into_iter()
        .find_map(|item| item.id.video_id.filter(|id| !id.is_empty()))
}

/// YouTube 试听（只支持具体曲目）
pub struct YoutubePreview {
    client: Client,
    api_key: String,
}

impl YoutubePreview {
    /// 未配置 key 时返回 None
    pub fn new(config: &YoutubeConfig) -> Result<Option<Self>, ProviderError> {
        if !config.is_configured() {
            return Ok(None);
        }
        Ok(Some(Self {
            client: build_client(TIMEOUT_SECS, USER_AGENT)?,
            api_key: config.api_key.trim().to_string(),
        }))
    }
}

#[async_trait]
impl PreviewProviderPort for YoutubePreview {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn find_preview(
        &self,
        artist: &str,
        track: Option<&str>,
    ) -> Result<Option<AudioPreview>, ProviderError> {
        let Some(track) = track else {
            return Ok(None);
        };
        let query = format!("{} {}", artist, track);
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("key", self.api_key.as_str()),
                ("type", "video"),
                ("maxResults", "1"),
            ])
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let body: SearchResponse = read_json(SERVICE, response).await?;

        Ok(first_video(body).map(|video_id| AudioPreview {
            source: "youtube".to_string(),
            artist: artist.to_string(),
            track: track.to_string(),
            preview_url: None,
            video_id: Some(video_id),
        }))
    }
}
