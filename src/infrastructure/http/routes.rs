//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/library           GET   曲库艺术家列表
//! - /api/library/refresh   POST  刷新曲库快照（广播 library_refreshed）
//! - /ws/discovery?user=id  WS    推荐会话 WebSocket

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api", api_routes())
        .route("/ws/discovery", get(handlers::discovery_websocket_handler))
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/library", get(handlers::list_library))
        .route("/library/refresh", post(handlers::refresh_library))
}
