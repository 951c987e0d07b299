//! Lidarr Client - 曲库管理器
//!
//! 实现 LibraryClientPort
//!
//! Lidarr API:
//! GET  {url}/api/v1/artist   -> [{"artistName": "..."}]
//! POST {url}/api/v1/artist   (X-Api-Key)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base, USER_AGENT};
use crate::application::ports::{
    AddArtistOutcome, AddArtistRequest, LibraryClientPort, ProviderError,
};
use crate::config::LidarrConfig;

const SERVICE: &str = "Lidarr";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LidarrArtist {
    artist_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddOptionsBody {
    search_for_missing_albums: bool,
    monitored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    albums_to_monitor: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddArtistBody {
    artist_name: String,
    quality_profile_id: i64,
    metadata_profile_id: i64,
    path: String,
    root_folder_path: String,
    foreign_artist_id: String,
    monitored: bool,
    add_options: AddOptionsBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor_new_items: Option<String>,
}

impl AddArtistBody {
    fn from_request(request: &AddArtistRequest) -> Self {
        let options = &request.options;
        // 文件夹名不能含路径分隔符
        let folder = request.name.replace('/', " ");
        let root = if options.root_folder_path.ends_with('/') {
            options.root_folder_path.clone()
        } else {
            format!("{}/", options.root_folder_path)
        };
        Self {
            artist_name: request.name.clone(),
            quality_profile_id: options.quality_profile_id,
            metadata_profile_id: options.metadata_profile_id,
            path: format!("{}{}/", root, folder),
            root_folder_path: options.root_folder_path.clone(),
            foreign_artist_id: request.foreign_artist_id.clone(),
            monitored: options.monitored,
            add_options: AddOptionsBody {
                search_for_missing_albums: options.search_for_missing_albums,
                monitored: options.monitored,
                monitor: options.monitor.clone(),
                albums_to_monitor: options.albums_to_monitor.clone(),
            },
            monitor_new_items: options.monitor_new_items.clone(),
        }
    }
}

/// 按 Lidarr 的错误响应归类
fn classify_failure(status: StatusCode, body: &str) -> AddArtistOutcome {
    let lowered = body.to_lowercase();
    if lowered.contains("already been added") || lowered.contains("already exists") {
        AddArtistOutcome::AlreadyPresent
    } else if lowered.contains("path") && lowered.contains("valid") {
        AddArtistOutcome::InvalidPath
    } else {
        let snippet: String = body.chars().take(200).collect();
        AddArtistOutcome::Failed(format!("HTTP {}: {}", status, snippet))
    }
}

/// Lidarr 客户端
pub struct LidarrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LidarrClient {
    pub fn new(config: &LidarrConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout_secs, USER_AGENT)?,
            base_url: trim_base(&config.url),
            api_key: config.api_key.clone(),
        })
    }

    fn artist_url(&self) -> String {
        format!("{}/api/v1/artist", self.base_url)
    }
}

#[async_trait]
impl LibraryClientPort for LidarrClient {
    async fn list_artists(&self) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(self.artist_url())
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;

        let artists: Vec<LidarrArtist> = read_json(SERVICE, response).await?;
        Ok(artists.into_iter().map(|a| a.artist_name).collect())
    }

    async fn add_artist(&self, request: AddArtistRequest) -> Result<AddArtistOutcome, ProviderError> {
        let body = AddArtistBody::from_request(&request);

        if request.options.dry_run {
            tracing::info!(
                artist = %request.name,
                foreign_artist_id = %request.foreign_artist_id,
                path = %body.path,
                "Dry run: artist not sent to Lidarr"
            );
            return Ok(AddArtistOutcome::Added);
        }

        let response = self
            .client
            .post(self.artist_url())
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(artist = %request.name, "Artist added to Lidarr");
            return Ok(AddArtistOutcome::Added);
        }

        let text = response.text().await.unwrap_or_default();
        let outcome = classify_failure(status, &text);
        tracing::warn!(
            artist = %request.name,
            status = %status,
            outcome = ?outcome,
            "Lidarr rejected artist"
        );
        Ok(outcome)
    }
}
