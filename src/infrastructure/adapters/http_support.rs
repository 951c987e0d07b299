//! 共用 HTTP 工具：客户端构建与错误映射

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::application::ports::ProviderError;

/// 默认 User-Agent
pub const USER_AGENT: &str = concat!("discoverr/", env!("CARGO_PKG_VERSION"));

/// 构建带超时的客户端
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(user_agent)
        .build()
        .map_err(|e| ProviderError::Network(e.to_string()))
}

/// reqwest 错误 -> ProviderError
pub fn map_reqwest_error(service: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else if err.is_decode() {
        ProviderError::InvalidResponse(format!("{}: {}", service, err))
    } else if err.is_connect() {
        ProviderError::Network(format!("Cannot connect to {}: {}", service, err))
    } else {
        ProviderError::Network(format!("{}: {}", service, err))
    }
}

/// 非 2xx 响应转为错误（404 -> NotFound）
pub async fn ensure_success(service: &str, response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body = body.chars().take(200).collect::<String>();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(format!("{}: {}", service, body)));
    }
    Err(ProviderError::Service(format!(
        "{} returned HTTP {}: {}",
        service, status, body
    )))
}

/// 读取 JSON 响应体
pub async fn read_json<T: DeserializeOwned>(
    service: &str,
    response: Response,
) -> Result<T, ProviderError> {
    let response = ensure_success(service, response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", service, e)))
}

/// 去掉 base url 结尾的斜杠
pub fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("http://lidarr:8686/"), "http://lidarr:8686");
        assert_eq!(trim_base("http://lidarr:8686"), "http://lidarr:8686");
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(0, USER_AGENT).is_ok());
    }
}
