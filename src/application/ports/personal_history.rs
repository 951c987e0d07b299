//! Personal History Port - 个人听歌历史

use async_trait::async_trait;

use super::ProviderError;

/// 个人推荐来源（每个来源可有多种策略）
#[async_trait]
pub trait PersonalHistoryPort: Send + Sync {
    /// 策略名称（用于日志）
    fn label(&self) -> &str;

    /// 获取用户的推荐艺术家名称
    async fn recommendations_for(&self, username: &str) -> Result<Vec<String>, ProviderError>;
}
