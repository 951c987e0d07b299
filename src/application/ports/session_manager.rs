//! Session Manager Port - 会话注册表
//!
//! 连接 id -> 会话句柄，首次引用时创建，断开连接时移除

use std::sync::Arc;

use thiserror::Error;

use crate::application::discovery::DiscoverySession;
use crate::domain::discovery::SessionIdentity;

/// Session Manager 错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
}

/// Session Manager Port
pub trait SessionManagerPort: Send + Sync {
    /// 获取会话，不存在时创建；已存在时更新身份
    fn open(&self, id: &str, identity: SessionIdentity) -> Arc<DiscoverySession>;

    /// 获取会话
    fn get(&self, id: &str) -> Result<Arc<DiscoverySession>, SessionError>;

    /// 关闭会话（取消进行中的 run）
    fn close(&self, id: &str) -> Result<(), SessionError>;

    /// 更新最后活动时间
    fn touch(&self, id: &str);

    /// 获取所有会话 ID
    fn list_all(&self) -> Vec<String>;
}
