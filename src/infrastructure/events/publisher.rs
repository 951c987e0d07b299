//! Event Publisher Implementation
//!
//! WebSocket 事件推送实现

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{DiscoveryEvent, DiscoveryEventSink};
use crate::application::{ArtistPreviewResponse, PersonalSourceState, PrehearResponse};
use crate::domain::discovery::{ArtistCard, ErrorKind, LibraryItem};

/// 单个会话通道的缓冲容量
const CHANNEL_CAPACITY: usize = 256;

/// WebSocket 事件类型
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WsEvent {
    /// 连接建立后的身份信息
    UserInfo {
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        is_admin: bool,
    },
    /// 曲库勾选列表
    LibraryUpdate {
        artists: Vec<LibraryItem>,
        running: bool,
    },
    /// 清空已有卡片
    Clear,
    ArtistLoaded(ArtistCard),
    InitialLoadComplete { has_more: bool },
    LoadMoreComplete { has_more: bool },
    SeedsAccepted {
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        username: Option<String>,
        seeds: Vec<String>,
        skipped: Vec<String>,
    },
    /// run 级失败
    DiscoveryFailed {
        kind: ErrorKind,
        #[serde(skip_serializing_if = "Option::is_none")]
        source: Option<String>,
        message: String,
    },
    /// 提示消息（toast）
    Notice { title: String, message: String },
    /// 卡片状态更新
    ArtistRefreshed(ArtistCard),
    PersonalSourcesState { sources: Vec<PersonalSourceState> },
    ArtistPreview(ArtistPreviewResponse),
    PrehearResult(PrehearResponse),
    /// 曲库快照已刷新（全局广播）
    LibraryRefreshed { artist_count: usize },
}

impl From<DiscoveryEvent> for WsEvent {
    fn from(event: DiscoveryEvent) -> Self {
        match event {
            DiscoveryEvent::LibraryUpdate { artists, running } => {
                WsEvent::LibraryUpdate { artists, running }
            }
            DiscoveryEvent::Clear => WsEvent::Clear,
            DiscoveryEvent::ArtistLoaded(card) => WsEvent::ArtistLoaded(card),
            DiscoveryEvent::InitialLoadComplete { has_more } => {
                WsEvent::InitialLoadComplete { has_more }
            }
            DiscoveryEvent::LoadMoreComplete { has_more } => WsEvent::LoadMoreComplete { has_more },
            DiscoveryEvent::SeedsAccepted {
                source,
                username,
                seeds,
                skipped,
            } => WsEvent::SeedsAccepted {
                source,
                username,
                seeds,
                skipped,
            },
            DiscoveryEvent::Failed { error, source } => WsEvent::DiscoveryFailed {
                kind: error.kind(),
                source,
                message: error.user_message(),
            },
            DiscoveryEvent::Notice { title, message } => WsEvent::Notice { title, message },
            DiscoveryEvent::ArtistRefreshed(card) => WsEvent::ArtistRefreshed(card),
        }
    }
}

/// 事件发布器
pub struct EventPublisher {
    /// session_id -> broadcast sender
    session_channels: DashMap<String, broadcast::Sender<WsEvent>>,
    /// 全局广播（曲库刷新）
    global_channel: broadcast::Sender<WsEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            session_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全局事件
    pub fn subscribe_global(&self) -> broadcast::Receiver<WsEvent> {
        self.global_channel.subscribe()
    }

    /// 注册会话的事件通道
    pub fn register_session(&self, session_id: &str) -> broadcast::Receiver<WsEvent> {
        if let Some(sender) = self.session_channels.get(session_id) {
            return sender.subscribe();
        }

        let (tx, rx) = broadcast::channel(CHANNEL_CAPACITY);
        self.session_channels.insert(session_id.to_string(), tx);
        rx
    }

    /// 取消注册会话
    pub fn unregister_session(&self, session_id: &str) {
        self.session_channels.remove(session_id);
    }

    pub fn is_registered(&self, session_id: &str) -> bool {
        self.session_channels.contains_key(session_id)
    }

    /// 发布曲库刷新事件（全局广播）
    pub fn publish_library_refreshed(&self, artist_count: usize) {
        let event = WsEvent::LibraryRefreshed { artist_count };
        if let Err(e) = self.global_channel.send(event) {
            tracing::debug!(
                error = %e,
                "Failed to publish LibraryRefreshed event (no receivers)"
            );
        }
    }

    /// 发布事件到指定会话
    pub fn publish_to_session(&self, session_id: &str, event: WsEvent) {
        if let Some(sender) = self.session_channels.get(session_id) {
            if let Err(e) = sender.send(event) {
                tracing::debug!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to publish event (no receivers)"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscoveryEventSink for EventPublisher {
    fn publish(&self, session_id: &str, event: DiscoveryEvent) {
        self.publish_to_session(session_id, event.into());
    }
}
