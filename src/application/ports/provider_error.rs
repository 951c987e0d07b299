//! 协作方调用错误
//!
//! 所有外部协作方（曲库管理器、相似艺术家图谱、LLM、元数据源等）共用

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }
}
