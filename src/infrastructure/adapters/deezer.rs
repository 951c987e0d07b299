//! Deezer Artwork - 艺术家封面
//!
//! GET {url}/search/artist?q={name}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base, USER_AGENT};
use crate::application::ports::{ArtworkProviderPort, ProviderError};
use crate::config::DeezerConfig;

const SERVICE: &str = "Deezer";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<DeezerArtist>,
}

#[derive(Debug, Deserialize)]
struct DeezerArtist {
    #[serde(default)]
    picture_xl: Option<String>,
    #[serde(default)]
    picture_big: Option<String>,
    #[serde(default)]
    picture_medium: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl DeezerArtist {
    /// 取最大的可用图片
    fn best_picture(self) -> Option<String> {
        [
            self.picture_xl,
            self.picture_big,
            self.picture_medium,
            self.picture,
        ]
        .into_iter()
        .flatten()
        .find(|url| !url.trim().is_empty())
    }
}

/// Deezer 封面查询
pub struct DeezerArtwork {
    client: Client,
    base_url: String,
}

impl DeezerArtwork {
    pub fn new(config: &DeezerConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout_secs, USER_AGENT)?,
            base_url: trim_base(&config.url),
        })
    }
}

#[async_trait]
impl ArtworkProviderPort for DeezerArtwork {
    async fn image_url(&self, name: &str) -> Result<Option<String>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/search/artist", self.base_url))
            .query(&[("q", name), ("limit", "1")])
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let body: SearchResponse = read_json(SERVICE, response).await?;
        Ok(body.data.into_iter().next().and_then(DeezerArtist::best_picture))
    }
}
