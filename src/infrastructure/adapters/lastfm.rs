//! Last.fm Client
//!
//! 一个 API key 覆盖多个端口：
//! - SimilarArtistProviderPort: `artist.getSimilar`
//! - MetadataProviderPort: `artist.getInfo` / `artist.getTopTags` / `artist.search` / `artist.getTopTracks`
//! - PersonalHistoryPort: `user.getRecommendedArtists`、`user.getTopArtists` 两种策略
//!
//! Last.fm 的数字字段是字符串，单元素列表有时是对象而不是数组

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::http_support::{build_client, map_reqwest_error, trim_base, USER_AGENT};
use crate::application::ports::{
    ArtistBiography, ArtistMetadata, MetadataProviderPort, PersonalHistoryPort, ProviderError,
    SimilarArtist, SimilarArtistProviderPort,
};
use crate::config::LastFmConfig;

const SERVICE: &str = "Last.fm";

/// 每个种子取的相似艺术家数量
const SIMILAR_LIMIT: usize = 100;

/// 个人推荐条数
const PERSONAL_LIMIT: usize = 50;

/// Last.fm 默认星形占位图的文件名
const LASTFM_PLACEHOLDER_HASH: &str = "2a96cbd8b46e442fc41c2b86b821562f";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Many(Vec::new())
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: String,
}

#[derive(Debug, Deserialize)]
struct SimilarItem {
    name: String,
    #[serde(rename = "match", default)]
    score: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct SimilarEnvelope {
    similarartists: SimilarList,
}

#[derive(Debug, Deserialize)]
struct SimilarList {
    #[serde(default)]
    artist: OneOrMany<SimilarItem>,
}

#[derive(Debug, Deserialize)]
struct InfoEnvelope {
    artist: ArtistInfo,
}

#[derive(Debug, Deserialize)]
struct ArtistInfo {
    name: String,
    #[serde(default)]
    stats: Option<ArtistStats>,
    #[serde(default)]
    image: OneOrMany<ImageItem>,
    #[serde(default)]
    bio: Option<ArtistBio>,
}

#[derive(Debug, Deserialize)]
struct ArtistStats {
    #[serde(default)]
    listeners: Option<String>,
    #[serde(default)]
    playcount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageItem {
    #[serde(rename = "#text", default)]
    url: String,
    #[serde(default)]
    size: String,
}

#[derive(Debug, Deserialize)]
struct ArtistBio {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    summary: Option<String>,
}

/// 各类 `{"xxx": [{"name": ...}]}` 列表
#[derive(Debug, Deserialize)]
struct NamedList {
    #[serde(default, alias = "tag", alias = "track", alias = "artist")]
    items: OneOrMany<NamedItem>,
}

#[derive(Debug, Deserialize)]
struct TopTagsEnvelope {
    toptags: NamedList,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    results: SearchResults,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    artistmatches: NamedList,
}

#[derive(Debug, Deserialize)]
struct TopTracksEnvelope {
    toptracks: NamedList,
}

#[derive(Debug, Deserialize)]
struct RecommendationsEnvelope {
    recommendations: NamedList,
}

#[derive(Debug, Deserialize)]
struct TopArtistsEnvelope {
    topartists: NamedList,
}

fn names(list: NamedList) -> Vec<String> {
    list.items
        .into_vec()
        .into_iter()
        .map(|item| item.name)
        .filter(|name| !name.trim().is_empty())
        .collect()
}

fn parse_score(raw: Option<serde_json::Value>) -> Option<f64> {
    match raw? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_count(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// 取最大尺寸的真实图片
fn pick_image(images: OneOrMany<ImageItem>) -> Option<String> {
    const ORDER: &[&str] = &["mega", "extralarge", "large", "medium", "small"];
    let images: Vec<ImageItem> = images
        .into_vec()
        .into_iter()
        .filter(|i| !i.url.is_empty() && !i.url.contains(LASTFM_PLACEHOLDER_HASH))
        .collect();
    ORDER
        .iter()
        .find_map(|size| images.iter().find(|i| i.size == *size))
        .or_else(|| images.first())
        .map(|i| i.url.clone())
}

/// 简介正文，去掉 Last.fm 附加的 "Read more on Last.fm" 链接
fn clean_bio(bio: Option<ArtistBio>) -> Option<String> {
    let bio = bio?;
    let text = bio
        .content
        .filter(|c| !c.trim().is_empty())
        .or(bio.summary)?;
    let text = match text.find("<a href=\"https://www.last.fm") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Last.fm 错误码 -> ProviderError
fn api_error(code: i64, message: &str) -> ProviderError {
    match code {
        6 => ProviderError::NotFound(message.to_string()),
        10 | 26 => ProviderError::NotConfigured(format!("{}: {}", SERVICE, message)),
        _ => ProviderError::Service(format!("{} error {}: {}", SERVICE, code, message)),
    }
}

/// 解析响应体：先检查 `{"error": n, "message": "..."}`，再反序列化
fn decode<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, ProviderError> {
    if let Some(code) = body.get("error").and_then(|e| e.as_i64()) {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error");
        return Err(api_error(code, message));
    }
    serde_json::from_value(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", SERVICE, e)))
}

// ============================================================================
// Client
// ============================================================================

/// Last.fm 客户端
pub struct LastFmClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LastFmClient {
    pub fn new(config: &LastFmConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeout_secs, USER_AGENT)?,
            base_url: trim_base(&config.url),
            api_key: config.api_key.trim().to_string(),
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "{} API key is not set",
                SERVICE
            )));
        }

        let mut query: Vec<(&str, &str)> = vec![
            ("method", method),
            ("api_key", self.api_key.as_str()),
            ("format", "json"),
        ];
        query.extend_from_slice(params);

        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&query)
            .send()
            .await
            .map_err(|e| map_reqwest_error(SERVICE, e))?;

        // 错误时 Last.fm 同样返回 JSON 错误体，按错误码归类
        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| {
            if status.is_success() {
                ProviderError::InvalidResponse(format!("{}: {}", SERVICE, e))
            } else {
                ProviderError::Service(format!("{} returned HTTP {}", SERVICE, status))
            }
        })?;
        decode(body)
    }

    async fn user_artists(
        &self,
        strategy: LastFmStrategy,
        username: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let limit = PERSONAL_LIMIT.to_string();
        let params = [("user", username), ("limit", limit.as_str())];
        match strategy {
            LastFmStrategy::Recommended => {
                let envelope: RecommendationsEnvelope =
                    self.call("user.getRecommendedArtists", &params).await?;
                Ok(names(envelope.recommendations))
            }
            LastFmStrategy::TopArtists => {
                let envelope: TopArtistsEnvelope = self.call("user.getTopArtists", &params).await?;
                Ok(names(envelope.topartists))
            }
        }
    }
}

#[async_trait]
impl SimilarArtistProviderPort for LastFmClient {
    async fn neighbors(&self, name: &str) -> Result<Vec<SimilarArtist>, ProviderError> {
        let limit = SIMILAR_LIMIT.to_string();
        let envelope: SimilarEnvelope = self
            .call(
                "artist.getSimilar",
                &[("artist", name), ("limit", limit.as_str()), ("autocorrect", "1")],
            )
            .await?;

        Ok(envelope
            .similarartists
            .artist
            .into_vec()
            .into_iter()
            .filter(|item| !item.name.trim().is_empty())
            .map(|item| SimilarArtist::new(item.name, parse_score(item.score)))
            .collect())
    }
}

#[async_trait]
impl MetadataProviderPort for LastFmClient {
    async fn describe(&self, name: &str) -> Result<ArtistMetadata, ProviderError> {
        let envelope: InfoEnvelope = self
            .call("artist.getInfo", &[("artist", name), ("autocorrect", "1")])
            .await?;
        let info = envelope.artist;

        // 标签单独查询，失败时只丢标签
        let tags = match self
            .call::<TopTagsEnvelope>("artist.getTopTags", &[("artist", name), ("autocorrect", "1")])
            .await
        {
            Ok(envelope) => Some(names(envelope.toptags)),
            Err(e) => {
                tracing::warn!(artist = %name, error = %e, "Failed to load Last.fm tags");
                None
            }
        };

        let stats = info.stats.as_ref();
        Ok(ArtistMetadata {
            name: info.name,
            tags,
            listener_count: parse_count(stats.and_then(|s| s.listeners.as_ref())),
            play_count: parse_count(stats.and_then(|s| s.playcount.as_ref())),
            image_url: pick_image(info.image),
        })
    }

    async fn search_artists(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        let envelope: SearchEnvelope = self
            .call("artist.search", &[("artist", name), ("limit", "10")])
            .await?;
        Ok(names(envelope.results.artistmatches))
    }

    async fn biography(&self, name: &str) -> Result<ArtistBiography, ProviderError> {
        let envelope: InfoEnvelope = self
            .call("artist.getInfo", &[("artist", name)])
            .await?;
        Ok(ArtistBiography {
            name: envelope.artist.name,
            biography: clean_bio(envelope.artist.bio),
        })
    }

    async fn top_tracks(&self, name: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let limit = limit.to_string();
        let envelope: TopTracksEnvelope = self
            .call(
                "artist.getTopTracks",
                &[("artist", name), ("limit", limit.as_str()), ("autocorrect", "1")],
            )
            .await?;
        Ok(names(envelope.toptracks))
    }
}

/// Last.fm 个人推荐策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastFmStrategy {
    /// Last.fm 为用户生成的推荐艺术家
    Recommended,
    /// 用户最常听的艺术家
    TopArtists,
}

/// Last.fm 个人历史（按策略）
pub struct LastFmHistory {
    client: Arc<LastFmClient>,
    strategy: LastFmStrategy,
}

impl LastFmHistory {
    pub fn new(client: Arc<LastFmClient>, strategy: LastFmStrategy) -> Self {
        Self { client, strategy }
    }

    /// 推荐 -> 常听 的默认回退顺序
    pub fn chain(client: Arc<LastFmClient>) -> Vec<Arc<dyn PersonalHistoryPort>> {
        vec![
            Arc::new(Self::new(client.clone(), LastFmStrategy::Recommended)),
            Arc::new(Self::new(client, LastFmStrategy::TopArtists)),
        ]
    }
}

#[async_trait]
impl PersonalHistoryPort for LastFmHistory {
    fn label(&self) -> &str {
        match self.strategy {
            LastFmStrategy::Recommended => "lastfm-recommended",
            LastFmStrategy::TopArtists => "lastfm-top-artists",
        }
    }

    async fn recommendations_for(&self, username: &str) -> Result<Vec<String>, ProviderError> {
        self.client.user_artists(self.strategy, username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_similar_with_string_scores() {
        let body = json!({
            "similarartists": {
                "artist": [
                    {"name": "Coldplay", "match": "0.83"},
                    {"name": "Keane", "match": 0.5},
                    {"name": "Mystery"}
                ]
            }
        });
        let envelope: SimilarEnvelope = decode(body).unwrap();
        let items = envelope.similarartists.artist.into_vec();
        assert_eq!(items.len(), 3);
        assert_eq!(parse_score(items[0].score.clone()), Some(0.83));
        assert_eq!(parse_score(items[1].score.clone()), Some(0.5));
        assert_eq!(parse_score(items[2].score.clone()), None);
    }

    #[test]
    fn test_single_item_object_is_accepted() {
        let body = json!({"toptracks": {"track": {"name": "Hysteria"}}});
        let envelope: TopTracksEnvelope = decode(body).unwrap();
        assert_eq!(names(envelope.toptracks), vec!["Hysteria"]);
    }

    #[test]
    fn test_error_codes() {
        let not_found: Result<InfoEnvelope, _> =
            decode(json!({"error": 6, "message": "The artist you supplied could not be found"}));
        assert!(matches!(not_found, Err(ProviderError::NotFound(_))));

        let bad_key: Result<InfoEnvelope, _> =
            decode(json!({"error": 10, "message": "Invalid API key"}));
        assert!(matches!(bad_key, Err(ProviderError::NotConfigured(_))));

        let other: Result<InfoEnvelope, _> = decode(json!({"error": 29, "message": "Rate limit"}));
        assert!(matches!(other, Err(ProviderError::Service(_))));
    }

    #[test]
    fn test_info_counts_and_image() {
        let body = json!({
            "artist": {
                "name": "Muse",
                "stats": {"listeners": "4200000", "playcount": "not-a-number"},
                "image": [
                    {"#text": "https://lastfm.freetls.fastly.net/i/u/34s/2a96cbd8b46e442fc41c2b86b821562f.png", "size": "small"},
                    {"#text": "https://img.example/muse-large.png", "size": "large"}
                ]
            }
        });
        let envelope: InfoEnvelope = decode(body).unwrap();
        let stats = envelope.artist.stats.as_ref();
        assert_eq!(
            parse_count(stats.and_then(|s| s.listeners.as_ref())),
            Some(4_200_000)
        );
        assert_eq!(parse_count(stats.and_then(|s| s.playcount.as_ref())), None);
        assert_eq!(
            pick_image(envelope.artist.image).as_deref(),
            Some("https://img.example/muse-large.png")
        );
    }

    #[test]
    fn test_clean_bio_strips_link() {
        let bio = ArtistBio {
            content: Some(
                "Muse are an English rock band. <a href=\"https://www.last.fm/music/Muse\">Read more on Last.fm</a>"
                    .to_string(),
            ),
            summary: None,
        };
        assert_eq!(
            clean_bio(Some(bio)).as_deref(),
            Some("Muse are an English rock band.")
        );

        let empty = ArtistBio {
            content: Some(" ".to_string()),
            summary: Some("".to_string()),
        };
        assert_eq!(clean_bio(Some(empty)), None);
    }

    #[test]
    fn test_search_and_user_lists() {
        let search: SearchEnvelope = decode(json!({
            "results": {"artistmatches": {"artist": [{"name": "Björk"}, {"name": ""}]}}
        }))
        .unwrap();
        assert_eq!(names(search.results.artistmatches), vec!["Björk"]);

        let top: TopArtistsEnvelope =
            decode(json!({"topartists": {"artist": [{"name": "Muse"}]}})).unwrap();
        assert_eq!(names(top.topartists), vec!["Muse"]);
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = LastFmClient::new(&LastFmConfig::default()).unwrap();
        let err = client.neighbors("Muse").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn test_history_labels() {
        let client = LastFmClient::new(&LastFmConfig::default()).unwrap().arc();
        let chain = LastFmHistory::chain(client);
        let labels: Vec<_> = chain.iter().map(|h| h.label().to_string()).collect();
        assert_eq!(labels, vec!["lastfm-recommended", "lastfm-top-artists"]);
    }
}
