//! 有序回退链
//!
//! 按顺序尝试各策略，第一个给出结果的策略胜出。
//! 单个策略出错只记录日志并继续；全部策略都出错时返回最后一个错误。

use async_trait::async_trait;

use crate::application::ports::ProviderError;

/// 回退链中的一个策略
#[async_trait]
pub trait Attempt<T>: Send + Sync {
    fn label(&self) -> String;

    /// `Ok(None)` 表示该策略没有结果，继续下一个
    async fn run(&self) -> Result<Option<T>, ProviderError>;
}

pub struct FallbackChain<T> {
    attempts: Vec<Box<dyn Attempt<T>>>,
}

impl<T: Send> FallbackChain<T> {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn then(mut self, attempt: impl Attempt<T> + 'static) -> Self {
        self.attempts.push(Box::new(attempt));
        self
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// 执行回退链
    pub async fn first_present(&self) -> Result<Option<T>, ProviderError> {
        let mut last_error = None;
        let mut any_answered = false;

        for attempt in &self.attempts {
            match attempt.run().await {
                Ok(Some(value)) => {
                    tracing::debug!(strategy = %attempt.label(), "Fallback strategy succeeded");
                    return Ok(Some(value));
                }
                Ok(None) => {
                    any_answered = true;
                    tracing::debug!(strategy = %attempt.label(), "Fallback strategy returned nothing");
                }
                Err(e) => {
                    tracing::warn!(strategy = %attempt.label(), error = %e, "Fallback strategy failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !any_answered => Err(e),
            _ => Ok(None),
        }
    }
}

impl<T: Send> Default for FallbackChain<T> {
    fn default() -> Self {
        Self::new()
    }
}
