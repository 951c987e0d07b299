//! MusicBrainz Client
//!
//! - KeywordSearchPort: 关键字搜索种子
//! - ArtistIdentityPort: 加入曲库前解析 MBID
//!
//! GET {url}/artist/?query=artist:{name}&fmt=json

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, read_json, trim_base};
use crate::application::ports::{ArtistIdentityPort, CatalogArtist, KeywordSearchPort, ProviderError};
use crate::config::MusicBrainzConfig;

const SERVICE: &str = "MusicBrainz";

const SEARCH_LIMIT: &str = "25";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    artists: Vec<MbArtist>,
}

#[derive(Debug, Deserialize)]
struct MbArtist {
    id: String,
    name: String,
}

/// Lucene 查询中的特殊字符需要转义
fn escape_query(raw: &str) -> String {
    const SPECIAL: &[char] = &[
        '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '"', '~', '*', '?', ':', '\\',
        '/',
    ];
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// MusicBrainz 客户端
pub struct MusicBrainzClient {
    client: Client,
    base_url: String,
}

impl MusicBrainzClient {
    pub fn new(config: &MusicBrainzConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout_secs, &config.user_agent)?,
            base_url: trim_base(&config.url),
        })
    }

    async fn search_artists(&self, name: &str) -> Result<Vec<MbArtist>, ProviderError> {
        let query = format!("artist:{}", escape_query(name));
        let response = self
            .client
            .get(format!("{}/artist/", self.base_url))
            .query(&[("query", query.as_str()), ("fmt", "json"), ("limit", SEARCH_LIMIT)])
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;

        let body: SearchResponse = read_json(SERVICE, response).await?;
        tracing::debug!(query = %name, results = body.artists.len(), "MusicBrainz search finished");
        Ok(body.artists)
    }
}

#[async_trait]
impl KeywordSearchPort for MusicBrainzClient {
    async fn search(&self, query: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self
            .search_artists(query)
            .await?
            .into_iter()
            .map(|a| a.name)
            .collect())
    }
}

#[async_trait]
impl ArtistIdentityPort for MusicBrainzClient {
    async fn lookup(&self, name: &str) -> Result<Vec<CatalogArtist>, ProviderError> {
        Ok(self
            .search_artists(name)
            .await?
            .into_iter()
            .map(|a| CatalogArtist {
                id: a.id,
                name: a.name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_query() {
        assert_eq!(escape_query(" AC/DC "), "AC\\/DC");
        assert_eq!(escape_query("!!!"), "\\!\\!\\!");
        assert_eq!(escape_query("Muse"), "Muse");
    }

    #[test]
    fn test_parse_search_response() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"created":"x","count":2,"artists":[
                {"id":"9c9f1380","name":"Muse","score":100},
                {"id":"abc","name":"Muse Tribute","score":80}
            ]}"#,
        )
        .unwrap();
        assert_eq!(body.artists.len(), 2);
        assert_eq!(body.artists[0].id, "9c9f1380");

        let empty: SearchResponse = serde_json::from_str(r#"{"count":0}"#).unwrap();
        assert!(empty.artists.is_empty());
    }
}
