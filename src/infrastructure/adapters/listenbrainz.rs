//! ListenBrainz History - 每周探索歌单中的艺术家
//!
//! GET {url}/1/user/{user}/playlists/createdfor  -> 系统为用户生成的歌单
//! GET {url}/1/playlist/{mbid}                   -> 歌单曲目（creator 为艺术家）

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base, USER_AGENT};
use crate::application::ports::{PersonalHistoryPort, ProviderError};
use crate::config::ListenBrainzConfig;
use crate::domain::dedupe_names;

const SERVICE: &str = "ListenBrainz";

const EXPLORATION_TITLE: &str = "weekly exploration";

#[derive(Debug, Deserialize)]
struct PlaylistsResponse {
    #[serde(default)]
    playlists: Vec<PlaylistWrapper>,
}

#[derive(Debug, Deserialize)]
struct PlaylistWrapper {
    playlist: Playlist,
}

#[derive(Debug, Deserialize)]
struct Playlist {
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    track: Vec<PlaylistTrack>,
}

#[derive(Debug, Deserialize)]
struct PlaylistTrack {
    #[serde(default)]
    creator: Option<String>,
}

/// 最新的每周探索歌单 id（identifier 形如 https://listenbrainz.org/playlist/<mbid>）
fn exploration_playlist_id(response: &PlaylistsResponse) -> Option<String> {
    response
        .playlists
        .iter()
        .map(|w| &w.playlist)
        .find(|p| p.title.to_lowercase().contains(EXPLORATION_TITLE))
        .and_then(|p| p.identifier.rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn playlist_artists(playlist: Playlist) -> Vec<String> {
    let creators: Vec<String> = playlist
        .track
        .into_iter()
        .filter_map(|t| t.creator)
        .collect();
    dedupe_names(&creators)
}

/// ListenBrainz 个人历史
pub struct ListenBrainzHistory {
    client: Client,
    base_url: String,
}

impl ListenBrainzHistory {
    pub fn new(config: &ListenBrainzConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout_secs, USER_AGENT)?,
            base_url: trim_base(&config.url),
        })
    }
}

#[async_trait]
impl PersonalHistoryPort for ListenBrainzHistory {
    fn label(&self) -> &str {
        "listenbrainz-weekly-exploration"
    }

    async fn recommendations_for(&self, username: &str) -> Result<Vec<String>, ProviderError> {
        let response = self
            .client
            .get(format!(
                "{}/1/user/{}/playlists/createdfor",
                self.base_url, username
            ))
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let playlists: PlaylistsResponse = read_json(SERVICE, response).await?;

        let Some(playlist_id) = exploration_playlist_id(&playlists) else {
            tracing::debug!(username = %username, "No weekly exploration playlist");
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(format!("{}/1/playlist/{}", self.base_url, playlist_id))
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;
        let wrapper: PlaylistWrapper = read_json(SERVICE, response).await?;

        Ok(playlist_artists(wrapper.playlist))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_exploration_playlist() {
        let response: PlaylistsResponse = serde_json::from_str(
            r#"{"playlists":[
                {"playlist":{"identifier":"https://listenbrainz.org/playlist/aaa","title":"Daily Jams for bob"}},
                {"playlist":{"identifier":"https://listenbrainz.org/playlist/bbb","title":"Weekly Exploration for bob, week of 2024-01-01"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(exploration_playlist_id(&response).as_deref(), Some("bbb"));

        let none: PlaylistsResponse = serde_json::from_str(r#"{"playlists":[]}"#).unwrap();
        assert_eq!(exploration_playlist_id(&none), None);
    }

    #[test]
    fn test_playlist_artists_deduped() {
        let wrapper: PlaylistWrapper = serde_json::from_str(
            r#"{"playlist":{"title":"x","track":[
                {"creator":"Muse","title":"Uprising"},
                {"creator":"muse","title":"Starlight"},
                {"title":"no creator"},
                {"creator":"Björk"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(playlist_artists(wrapper.playlist), vec!["Muse", "Björk"]);
    }
}
