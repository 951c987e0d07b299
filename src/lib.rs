//! Discoverr - 音乐艺术家推荐会话服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Discovery Context: 候选、卡片、曲库快照、会话状态机、错误分类
//! - 名称规范化
//!
//! 应用层 (application/):
//! - Ports: 端口定义（曲库、相似艺术家、元数据、LLM、个人历史、试听、事件推送）
//! - Discovery: 种子解析、相似度扩展、补全网关、分批推送
//! - Commands / Queries: CQRS 处理器
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: REST API + WebSocket
//! - Memory: 会话注册表、曲库快照
//! - Persistence: SQLite（艺术家申请）
//! - Adapters: Lidarr, Last.fm, MusicBrainz, ListenBrainz, LLM, Deezer, iTunes, YouTube
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
