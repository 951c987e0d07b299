//! Discovery Event Sink Port - 向会话推送事件
//!
//! 推送通道（WebSocket 等）由基础设施层实现

use crate::domain::discovery::{ArtistCard, DiscoveryError, LibraryItem};

/// 推荐会话事件
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    /// 曲库勾选列表
    LibraryUpdate {
        artists: Vec<LibraryItem>,
        running: bool,
    },
    /// 新 run 开始，客户端清空已有卡片
    Clear,
    /// 单张卡片（逐张推送）
    ArtistLoaded(ArtistCard),
    /// 首批完成
    InitialLoadComplete { has_more: bool },
    /// "加载更多" 完成
    LoadMoreComplete { has_more: bool },
    /// 种子已确认
    SeedsAccepted {
        source: String,
        username: Option<String>,
        seeds: Vec<String>,
        skipped: Vec<String>,
    },
    /// run 级失败
    Failed {
        error: DiscoveryError,
        source: Option<String>,
    },
    /// 非阻塞提示（警告）
    Notice { title: String, message: String },
    /// 已发出卡片的状态变化
    ArtistRefreshed(ArtistCard),
}

impl DiscoveryEvent {
    pub fn notice(title: impl Into<String>, message: impl Into<String>) -> Self {
        DiscoveryEvent::Notice {
            title: title.into(),
            message: message.into(),
        }
    }
}

pub trait DiscoveryEventSink: Send + Sync {
    fn publish(&self, session_id: &str, event: DiscoveryEvent);
}
