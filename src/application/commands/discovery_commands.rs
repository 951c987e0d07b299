//! Discovery Commands - 推荐会话命令

/// 种子来源请求
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryRequest {
    /// 曲库勾选
    Selection(Vec<String>),
    /// 自由文本
    Prompt(String),
    /// 关键字搜索
    Search(String),
    /// 个人听歌历史（来源 key）
    PersonalSource(String),
}

impl DiscoveryRequest {
    /// 失败事件中携带的来源标识
    pub fn source_key(&self) -> String {
        match self {
            DiscoveryRequest::Selection(_) => "selection".to_string(),
            DiscoveryRequest::Prompt(_) => "prompt".to_string(),
            DiscoveryRequest::Search(_) => "search".to_string(),
            DiscoveryRequest::PersonalSource(key) if key.trim().is_empty() => "lastfm".to_string(),
            DiscoveryRequest::PersonalSource(key) => key.trim().to_ascii_lowercase(),
        }
    }
}

/// 开始推荐命令 - 新 run 取代进行中的 run
#[derive(Debug, Clone)]
pub struct StartDiscovery {
    pub session_id: String,
    pub request: DiscoveryRequest,
}

/// 停止命令
#[derive(Debug, Clone)]
pub struct CancelDiscovery {
    pub session_id: String,
}

/// 停止响应
#[derive(Debug, Clone)]
pub struct CancelDiscoveryResponse {
    pub session_id: String,
    pub was_running: bool,
}

/// 加载更多命令
#[derive(Debug, Clone)]
pub struct LoadMoreArtists {
    pub session_id: String,
}
