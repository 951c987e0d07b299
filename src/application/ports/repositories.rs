//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（如 SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 艺术家申请状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "approved" => Some(RequestStatus::Approved),
            "rejected" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }
}

/// 艺术家申请记录
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistRequestRecord {
    pub id: Uuid,
    pub artist_name: String,
    pub requested_by: i64,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl ArtistRequestRecord {
    pub fn pending(artist_name: impl Into<String>, requested_by: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            artist_name: artist_name.into(),
            requested_by,
            status: RequestStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Artist Request Repository Port
#[async_trait]
pub trait ArtistRequestRepositoryPort: Send + Sync {
    /// 保存申请
    async fn save(&self, record: &ArtistRequestRecord) -> Result<(), RepositoryError>;

    /// 查找某用户对某艺术家（规范化名称比较）的待处理申请
    async fn find_pending(
        &self,
        requested_by: i64,
        artist_name: &str,
    ) -> Result<Option<ArtistRequestRecord>, RepositoryError>;

    /// 某用户的全部申请，按时间倒序
    async fn find_by_user(
        &self,
        requested_by: i64,
    ) -> Result<Vec<ArtistRequestRecord>, RepositoryError>;
}
