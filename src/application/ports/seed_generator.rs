//! Seed Generator Port - 自由文本种子生成（LLM）

use async_trait::async_trait;

use super::ProviderError;

#[async_trait]
pub trait SeedGeneratorPort: Send + Sync {
    /// 根据提示词和当前曲库生成种子艺术家名称
    async fn generate(
        &self,
        prompt: &str,
        library_names: &[String],
    ) -> Result<Vec<String>, ProviderError>;

    /// 模型描述（用于日志）
    fn model(&self) -> &str {
        "unknown"
    }
}
