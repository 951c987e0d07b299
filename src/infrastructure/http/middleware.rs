//! HTTP Middleware
//!
//! 请求结果日志。接口失败时仍返回 HTTP 200 + errno，
//! 所以除了状态码，还要读取 `ApiError` 附在响应上的 `ApiFailure`。

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

/// `ApiError` 渲染时写入响应扩展的失败信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure {
    pub errno: i32,
    pub message: String,
}

/// 错误日志中间件
///
/// - errno >= 500：error
/// - 其余 errno：warn
/// - 没有 errno 的 4xx/5xx（未匹配路由、静态文件缺失等）：按状态码记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let start = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match response.extensions().get::<ApiFailure>() {
        Some(failure) if failure.errno >= 500 => {
            tracing::error!(
                method = %method,
                route = %route,
                errno = failure.errno,
                error = %failure.message,
                elapsed_ms,
                "API request failed"
            );
        }
        Some(failure) => {
            tracing::warn!(
                method = %method,
                route = %route,
                errno = failure.errno,
                error = %failure.message,
                elapsed_ms,
                "API request rejected"
            );
        }
        None if status.is_server_error() => {
            tracing::error!(
                method = %method,
                route = %route,
                status = status.as_u16(),
                elapsed_ms,
                "HTTP server error"
            );
        }
        None if status.is_client_error() => {
            tracing::warn!(
                method = %method,
                route = %route,
                status = status.as_u16(),
                elapsed_ms,
                "HTTP client error"
            );
        }
        None => {}
    }

    response
}
