//! WebSocket Handler - 推荐会话
//!
//! 每个连接对应一个会话。客户端帧为 `{"action", "data"}`，服务端帧为 `{"event", "data"}`。
//! 停止请求在接收循环中直接处理，其余耗时操作在后台任务中执行。

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::application::ports::{UserDirectoryPort, UserProfile};
use crate::application::{
    AddArtist, ApplicationError, CancelDiscovery, GetPersonalSources,
    LoadMoreArtists, PrehearArtist, PreviewArtist, RequestArtist, StartDiscovery,
};
use crate::domain::discovery::SessionIdentity;
use crate::infrastructure::events::WsEvent;
use crate::infrastructure::http::dto::{ClientCommand, ClientFrame};
use crate::infrastructure::http::state::AppState;

/// 前置认证层注入身份时携带的密钥头
pub const IDENTITY_SECRET_HEADER: &str = "x-identity-secret";

/// 连接参数
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// 用户 id（由前置的身份层注入）
    #[serde(default)]
    pub user: Option<i64>,
}

/// 推荐会话 WebSocket
pub async fn discovery_websocket_handler(
    ws: WebSocketUpgrade,
    Query(mut params): Query<ConnectParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let presented = headers
        .get(IDENTITY_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    params.user = trusted_user(params.user, presented, state.identity_secret.as_deref());
    ws.on_upgrade(move |socket| handle_discovery_socket(socket, params, state))
}

/// 配置了密钥时，只有密钥匹配才采信声明的用户 id
fn trusted_user(user: Option<i64>, presented: Option<&str>, secret: Option<&str>) -> Option<i64> {
    match (secret, user) {
        (None, user) => user,
        (Some(_), None) => None,
        (Some(secret), Some(id)) => {
            if presented == Some(secret) {
                Some(id)
            } else {
                tracing::warn!(user_id = id, "Identity claim without valid secret, connecting anonymously");
                None
            }
        }
    }
}

/// 按用户 id 查找身份，未知用户按匿名处理
fn identify(
    users: &dyn UserDirectoryPort,
    user: Option<i64>,
) -> (SessionIdentity, Option<UserProfile>) {
    match user.and_then(|id| users.find(id)) {
        Some(profile) => (
            SessionIdentity {
                user_id: Some(profile.id),
                is_admin: profile.is_admin,
            },
            Some(profile),
        ),
        None => {
            if let Some(id) = user {
                tracing::warn!(user_id = id, "Unknown user, connecting anonymously");
            }
            (SessionIdentity::default(), None)
        }
    }
}

/// 命令失败转为客户端事件
fn error_event(error: ApplicationError, source: Option<String>) -> WsEvent {
    match error {
        ApplicationError::Discovery(e) => WsEvent::DiscoveryFailed {
            kind: e.kind(),
            source,
            message: e.user_message(),
        },
        ApplicationError::Forbidden(message) => WsEvent::Notice {
            title: "Not Allowed".to_string(),
            message,
        },
        ApplicationError::ValidationError(message) => WsEvent::Notice {
            title: "Invalid Request".to_string(),
            message,
        },
        other => WsEvent::Notice {
            title: "Error".to_string(),
            message: other.to_string(),
        },
    }
}

async fn handle_discovery_socket(socket: WebSocket, params: ConnectParams, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    let session_id = Uuid::new_v4().to_string();
    let (identity, profile) = identify(state.users.as_ref(), params.user);

    // 先注册通道，连接初始事件会缓冲到转发任务启动
    let mut event_rx = state.event_publisher.register_session(&session_id);
    let mut global_rx = state.event_publisher.subscribe_global();
    state.session_manager.open(&session_id, identity);

    tracing::info!(
        session_id = %session_id,
        user_id = ?identity.user_id,
        is_admin = identity.is_admin,
        "WebSocket connected"
    );

    state.event_publisher.publish_to_session(
        &session_id,
        WsEvent::UserInfo {
            username: profile.map(|p| p.username),
            is_admin: identity.is_admin,
        },
    );
    send_personal_sources(&state, &session_id);
    {
        let state = state.clone();
        let session_id = session_id.clone();
        tokio::spawn(async move { send_library(&state, &session_id).await });
    }

    let session_id_for_forward = session_id.clone();
    let session_id_for_receive = session_id.clone();

    // 事件转发任务（会话事件 + 全局事件）
    let mut forward_task = tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                event = event_rx.recv() => event,
                event = global_rx.recv() => event,
            };
            let event = match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        session_id = %session_id_for_forward,
                        skipped = skipped,
                        "WebSocket client lagging, events dropped"
                    );
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let msg = match serde_json::to_string(&event) {
                Ok(json) => Message::Text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to serialize event");
                    continue;
                }
            };

            if let Err(e) = sender.send(msg).await {
                tracing::debug!(
                    session_id = %session_id_for_forward,
                    error = %e,
                    "Failed to send WebSocket message"
                );
                break;
            }
        }
    });

    // 接收客户端指令
    let receive_state = state.clone();
    let mut receive_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    receive_state.session_manager.touch(&session_id_for_receive);
                    on_frame(&receive_state, &session_id_for_receive, &text);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(session_id = %session_id_for_receive, "WebSocket closed by client");
                    break;
                }
                Err(e) => {
                    tracing::debug!(session_id = %session_id_for_receive, error = %e, "WebSocket error");
                    break;
                }
                _ => {
                    receive_state.session_manager.touch(&session_id_for_receive);
                }
            }
        }
    });

    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    // 清理：取消进行中的 run 并注销通道
    if let Err(e) = state.session_manager.close(&session_id) {
        tracing::debug!(session_id = %session_id, error = %e, "Session already closed");
    }
    state.event_publisher.unregister_session(&session_id);
    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}

/// 解析并分发一个客户端帧
fn on_frame(state: &Arc<AppState>, session_id: &str, text: &str) {
    let command = match ClientFrame::parse(text).and_then(ClientFrame::into_command) {
        Ok(command) => command,
        Err(message) => {
            tracing::warn!(session_id = %session_id, error = %message, "Rejected client frame");
            state.event_publisher.publish_to_session(
                session_id,
                WsEvent::Notice {
                    title: "Invalid Request".to_string(),
                    message,
                },
            );
            return;
        }
    };

    tracing::debug!(session_id = %session_id, command = ?command, "Client command");

    if command == ClientCommand::Stop {
        let cmd = CancelDiscovery {
            session_id: session_id.to_string(),
        };
        if let Err(e) = state.cancel_discovery_handler.handle(cmd) {
            report(state, session_id, e, None);
        }
        return;
    }

    let state = state.clone();
    let session_id = session_id.to_string();
    tokio::spawn(async move { execute(&state, &session_id, command).await });
}

/// 执行耗时指令
async fn execute(state: &AppState, session_id: &str, command: ClientCommand) {
    let session_id_owned = session_id.to_string();
    match command {
        ClientCommand::Start(request) => {
            let source = request.source_key();
            let cmd = StartDiscovery {
                session_id: session_id_owned,
                request,
            };
            if let Err(e) = state.start_discovery_handler.handle(cmd).await {
                report(state, session_id, e, Some(source));
            }
        }
        ClientCommand::LoadMore => {
            let cmd = LoadMoreArtists {
                session_id: session_id_owned,
            };
            if let Err(e) = state.load_more_handler.handle(cmd).await {
                report(state, session_id, e, None);
            }
        }
        ClientCommand::AddArtist(artist_name) => {
            let cmd = AddArtist {
                session_id: session_id_owned,
                artist_name,
            };
            if let Err(e) = state.add_artist_handler.handle(cmd).await {
                report(state, session_id, e, None);
            }
        }
        ClientCommand::RequestArtist(artist_name) => {
            let cmd = RequestArtist {
                session_id: session_id_owned,
                artist_name,
            };
            if let Err(e) = state.request_artist_handler.handle(cmd).await {
                report(state, session_id, e, None);
            }
        }
        ClientCommand::Preview(artist_name) => {
            match state
                .preview_artist_handler
                .handle(PreviewArtist { artist_name })
                .await
            {
                Ok(preview) => state
                    .event_publisher
                    .publish_to_session(session_id, WsEvent::ArtistPreview(preview)),
                Err(e) => report(state, session_id, e, None),
            }
        }
        ClientCommand::Prehear(artist_name) => {
            match state.prehear_handler.handle(PrehearArtist { artist_name }).await {
                Ok(result) => state
                    .event_publisher
                    .publish_to_session(session_id, WsEvent::PrehearResult(result)),
                Err(e) => report(state, session_id, e, None),
            }
        }
        ClientCommand::SideBarOpened => send_library(state, session_id).await,
        ClientCommand::PersonalSourcesPoll => send_personal_sources(state, session_id),
        ClientCommand::Stop => {}
    }
}

fn report(state: &AppState, session_id: &str, error: ApplicationError, source: Option<String>) {
    tracing::debug!(session_id = %session_id, error = %error, "Command failed");
    state
        .event_publisher
        .publish_to_session(session_id, error_event(error, source));
}

/// 同步勾选列表并推送
async fn send_library(state: &AppState, session_id: &str) {
    let Ok(session) = state.session_manager.get(session_id) else {
        return;
    };
    let snapshot = state.engine.library().best_effort().await;
    session.with_state(|s| s.sync_library_items(snapshot.names()));
    state.engine.publish_library(&session);
}

fn send_personal_sources(state: &AppState, session_id: &str) {
    let query = GetPersonalSources {
        session_id: session_id.to_string(),
    };
    match state.personal_sources_handler.handle(query) {
        Ok(sources) => state
            .event_publisher
            .publish_to_session(session_id, WsEvent::PersonalSourcesState { sources }),
        Err(e) => tracing::warn!(session_id = %session_id, error = %e, "Personal sources unavailable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::FakeUserDirectory;
    use crate::domain::discovery::{DiscoveryError, ErrorKind};

    fn directory() -> FakeUserDirectory {
        FakeUserDirectory::with(vec![UserProfile {
            id: 7,
            username: "alice".to_string(),
            is_admin: true,
            ..UserProfile::default()
        }])
    }

    #[test]
    fn test_identify_known_user() {
        let (identity, profile) = identify(&directory(), Some(7));
        assert_eq!(identity.user_id, Some(7));
        assert!(identity.is_admin);
        assert_eq!(profile.map(|p| p.username).as_deref(), Some("alice"));
    }

    #[test]
    fn test_identify_unknown_or_missing_user_is_anonymous() {
        let (identity, profile) = identify(&directory(), Some(99));
        assert_eq!(identity, SessionIdentity::default());
        assert!(profile.is_none());

        let (identity, _) = identify(&directory(), None);
        assert_eq!(identity.user_id, None);
    }

    #[test]
    fn test_identity_claim_requires_secret_when_configured() {
        assert_eq!(trusted_user(Some(7), None, None), Some(7));
        assert_eq!(trusted_user(Some(7), Some("s3cret"), Some("s3cret")), Some(7));
        assert_eq!(trusted_user(Some(7), None, Some("s3cret")), None);
        assert_eq!(trusted_user(Some(7), Some("guess"), Some("s3cret")), None);
        assert_eq!(trusted_user(None, Some("s3cret"), Some("s3cret")), None);
    }

    #[test]
    fn test_discovery_error_becomes_failed_event() {
        let event = error_event(
            ApplicationError::Discovery(DiscoveryError::GeneratorUnavailable),
            Some("prompt".to_string()),
        );
        match event {
            WsEvent::DiscoveryFailed {
                kind,
                source,
                message,
            } => {
                assert_eq!(kind, ErrorKind::CollaboratorUnavailable);
                assert_eq!(source.as_deref(), Some("prompt"));
                assert!(message.contains("AI assistant"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_become_notices() {
        match error_event(ApplicationError::forbidden("admins only"), None) {
            WsEvent::Notice { title, message } => {
                assert_eq!(title, "Not Allowed");
                assert_eq!(message, "admins only");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
