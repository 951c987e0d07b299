//! HTTP Server
//!
//! Axum HTTP 服务器启动和配置

use std::path::PathBuf;
use std::sync::Arc;

use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::config;

/// 静态文件托管
#[derive(Debug, Clone)]
pub struct StaticFiles {
    pub dir: PathBuf,
    /// URL 前缀，"/" 表示作为兜底服务
    pub path: String,
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_files: Option<StaticFiles>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_files: None,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            static_files: None,
        }
    }

    pub fn with_static_files(mut self, dir: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        self.static_files = Some(StaticFiles {
            dir: dir.into(),
            path: path.into(),
        });
        self
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl From<&config::ServerConfig> for ServerConfig {
    fn from(config: &config::ServerConfig) -> Self {
        let server = Self::new(&config.host, config.port);
        if config.static_files.enabled {
            server.with_static_files(&config.static_files.dir, &config.static_files.path)
        } else {
            server
        }
    }
}

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    /// 创建新的 HTTP 服务器
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 构建 Router
    fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .expose_headers(Any)
            .max_age(std::time::Duration::from_secs(3600));

        let mut router = create_routes();
        if let Some(files) = &self.config.static_files {
            info!(dir = %files.dir.display(), path = %files.path, "Serving static files");
            let serve_dir = ServeDir::new(&files.dir);
            let path = files.path.trim_end_matches('/');
            router = if path.is_empty() {
                router.fallback_service(serve_dir)
            } else {
                router.nest_service(path, serve_dir)
            };
        }

        router
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器（带优雅关闭）
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();

        info!("Starting HTTP server on {} (with graceful shutdown)", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await?;

        Ok(())
    }
}
