//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::ports::{AddArtistOptions, UserProfile};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 曲库管理器（Lidarr）
    #[serde(default)]
    pub lidarr: LidarrConfig,

    /// Last.fm（相似艺术家、元数据、个人推荐）
    #[serde(default)]
    pub lastfm: LastFmConfig,

    /// LLM 种子生成器
    #[serde(default)]
    pub llm: LlmConfig,

    /// MusicBrainz 身份查询
    #[serde(default)]
    pub musicbrainz: MusicBrainzConfig,

    #[serde(default)]
    pub listenbrainz: ListenBrainzConfig,

    /// 封面图
    #[serde(default)]
    pub deezer: DeezerConfig,

    #[serde(default)]
    pub itunes: ItunesConfig,

    #[serde(default)]
    pub youtube: YoutubeConfig,

    /// 推荐流程参数
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 用户目录（仅身份信息，不做认证）
    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,

    /// 静态文件服务配置
    #[serde(default)]
    pub static_files: StaticFilesConfig,

    /// 前置认证层与本服务共享的密钥
    ///
    /// 设置后，只有携带匹配的 `X-Identity-Secret` 头的连接才会采信 `?user=`；
    /// 未设置时 `?user=` 原样采信，WebSocket 不得直接暴露给客户端
    #[serde(default)]
    pub identity_secret: Option<String>,
}

/// 静态文件服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct StaticFilesConfig {
    /// 是否启用静态文件服务
    #[serde(default)]
    pub enabled: bool,

    /// 静态文件目录
    #[serde(default = "default_static_dir")]
    pub dir: PathBuf,

    /// URL 路径前缀（如 "/" 表示根路径托管）
    #[serde(default = "default_static_path")]
    pub path: String,
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("web")
}

fn default_static_path() -> String {
    "/".to_string()
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_static_dir(),
            path: default_static_path(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
            static_files: StaticFilesConfig::default(),
            identity_secret: None,
        }
    }
}

impl ServerConfig {
    /// 非空的身份密钥
    pub fn identity_secret(&self) -> Option<&str> {
        self.identity_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

/// Lidarr 配置
#[derive(Debug, Clone, Deserialize)]
pub struct LidarrConfig {
    #[serde(default = "default_lidarr_url")]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_lidarr_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_root_folder")]
    pub root_folder_path: String,

    #[serde(default = "default_profile_id")]
    pub quality_profile_id: i64,

    #[serde(default = "default_profile_id")]
    pub metadata_profile_id: i64,

    #[serde(default = "default_true")]
    pub monitored: bool,

    /// 空字符串表示使用 Lidarr 默认值
    #[serde(default)]
    pub monitor_option: String,

    #[serde(default)]
    pub monitor_new_items: String,

    #[serde(default)]
    pub albums_to_monitor: Vec<String>,

    #[serde(default)]
    pub search_for_missing_albums: bool,

    /// 只记录日志，不真正添加
    #[serde(default)]
    pub dry_run: bool,
}

fn default_lidarr_url() -> String {
    "http://localhost:8686".to_string()
}

fn default_lidarr_timeout() -> u64 {
    120
}

fn default_root_folder() -> String {
    "/data/media/music/".to_string()
}

fn default_profile_id() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

impl Default for LidarrConfig {
    fn default() -> Self {
        Self {
            url: default_lidarr_url(),
            api_key: String::new(),
            timeout_secs: default_lidarr_timeout(),
            root_folder_path: default_root_folder(),
            quality_profile_id: default_profile_id(),
            metadata_profile_id: default_profile_id(),
            monitored: true,
            monitor_option: String::new(),
            monitor_new_items: String::new(),
            albums_to_monitor: Vec::new(),
            search_for_missing_albums: false,
            dry_run: false,
        }
    }
}

impl LidarrConfig {
    /// 转换为添加艺术家时使用的选项
    pub fn add_options(&self) -> AddArtistOptions {
        fn non_blank(value: &str) -> Option<String> {
            let trimmed = value.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }

        AddArtistOptions {
            root_folder_path: self.root_folder_path.clone(),
            quality_profile_id: self.quality_profile_id,
            metadata_profile_id: self.metadata_profile_id,
            monitored: self.monitored,
            monitor: non_blank(&self.monitor_option),
            monitor_new_items: non_blank(&self.monitor_new_items),
            albums_to_monitor: self
                .albums_to_monitor
                .iter()
                .filter_map(|a| non_blank(a))
                .collect(),
            search_for_missing_albums: self.search_for_missing_albums,
            dry_run: self.dry_run,
        }
    }
}

/// Last.fm 配置
#[derive(Debug, Clone, Deserialize)]
pub struct LastFmConfig {
    #[serde(default = "default_lastfm_url")]
    pub url: String,

    /// 为空时相似艺术家与元数据均不可用
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_lastfm_url() -> String {
    "https://ws.audioscrobbler.com/2.0/".to_string()
}

fn default_provider_timeout() -> u64 {
    15
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            url: default_lastfm_url(),
            api_key: String::new(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl LastFmConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// LLM 种子生成器配置（OpenAI 兼容接口）
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// 为空时使用 OpenAI 官方地址
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// 每次生成的最大种子数
    #[serde(default = "default_max_seed_artists")]
    pub max_seed_artists: usize,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

fn default_max_seed_artists() -> usize {
    5
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            model: default_llm_model(),
            timeout_secs: default_llm_timeout(),
            max_seed_artists: default_max_seed_artists(),
        }
    }
}

impl LlmConfig {
    /// api_key 或 url 任一非空即视为已配置（本地模型可能不需要 key）
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty() || !self.url.trim().is_empty()
    }
}

/// MusicBrainz 配置
#[derive(Debug, Clone, Deserialize)]
pub struct MusicBrainzConfig {
    #[serde(default = "default_musicbrainz_url")]
    pub url: String,

    /// MusicBrainz 要求可识别的 User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// 没有模糊匹配时使用第一条搜索结果
    #[serde(default)]
    pub fallback_to_top_result: bool,
}

fn default_musicbrainz_url() -> String {
    "https://musicbrainz.org/ws/2".to_string()
}

fn default_user_agent() -> String {
    format!(
        "discoverr/{} ( https://github.com/discoverr/discoverr )",
        env!("CARGO_PKG_VERSION")
    )
}

impl Default for MusicBrainzConfig {
    fn default() -> Self {
        Self {
            url: default_musicbrainz_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_provider_timeout(),
            fallback_to_top_result: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListenBrainzConfig {
    #[serde(default = "default_listenbrainz_url")]
    pub url: String,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_listenbrainz_url() -> String {
    "https://api.listenbrainz.org".to_string()
}

impl Default for ListenBrainzConfig {
    fn default() -> Self {
        Self {
            url: default_listenbrainz_url(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeezerConfig {
    #[serde(default = "default_deezer_url")]
    pub url: String,

    #[serde(default = "default_artwork_timeout")]
    pub timeout_secs: u64,
}

fn default_deezer_url() -> String {
    "https://api.deezer.com".to_string()
}

fn default_artwork_timeout() -> u64 {
    5
}

impl Default for DeezerConfig {
    fn default() -> Self {
        Self {
            url: default_deezer_url(),
            timeout_secs: default_artwork_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItunesConfig {
    #[serde(default = "default_itunes_url")]
    pub url: String,
}

fn default_itunes_url() -> String {
    "https://itunes.apple.com".to_string()
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            url: default_itunes_url(),
        }
    }
}

/// YouTube 配置，未配置 key 时跳过 YouTube 试听
#[derive(Debug, Clone, Default, Deserialize)]
pub struct YoutubeConfig {
    #[serde(default)]
    pub api_key: String,
}

impl YoutubeConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// 推荐流程参数
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// 每批卡片数
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// 候选列表上限
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,
}

fn default_batch_size() -> usize {
    10
}

fn default_candidate_cap() -> usize {
    500
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            candidate_cap: default_candidate_cap(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/discoverr.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 用户条目
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub lastfm_username: Option<String>,
    #[serde(default)]
    pub listenbrainz_username: Option<String>,
}

impl From<&UserConfig> for UserProfile {
    fn from(user: &UserConfig) -> Self {
        UserProfile {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            lastfm_username: user.lastfm_username.clone(),
            listenbrainz_username: user.listenbrainz_username.clone(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
