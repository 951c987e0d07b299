//! 会话句柄 - 每个连接一份
//!
//! 锁的使用约定:
//! - `state`：短临界区，只用于状态转换（开始、记录卡片、推进游标、结束），绝不跨越 await
//! - `batch_gate`：异步互斥，串行化同一会话的批次生产
//! - `control`：当前 run 的一次性取消令牌、开始请求代数、关闭标记
//!
//! 加锁顺序固定为 `control` -> `state`
//!
//! 开始一次 run 分两步：`prepare_start` 领取凭证，解析种子（慢调用，不持锁），
//! 再用凭证 `begin_run`。期间的停止、关闭或更新的开始请求都会让凭证失效。

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::domain::discovery::{RunTicket, SessionIdentity, SessionState};

/// 一次 run 的句柄：凭证 + 取消令牌
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub ticket: RunTicket,
    pub token: CancellationToken,
}

impl RunHandle {
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// 开始请求凭证
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartIntent(u64);

#[derive(Debug)]
struct RunControl {
    token: CancellationToken,
    generation: u64,
    closed: bool,
}

impl RunControl {
    fn invalidate_pending(&mut self) {
        self.generation += 1;
        self.token.cancel();
    }
}

/// 推荐会话
pub struct DiscoverySession {
    id: String,
    state: Mutex<SessionState>,
    control: Mutex<RunControl>,
    batch_gate: tokio::sync::Mutex<()>,
    created_at: DateTime<Utc>,
    last_activity: Mutex<DateTime<Utc>>,
}

impl DiscoverySession {
    pub fn new(id: impl Into<String>, identity: SessionIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: Mutex::new(SessionState::new(identity)),
            control: Mutex::new(RunControl {
                token: CancellationToken::new(),
                generation: 0,
                closed: false,
            }),
            batch_gate: tokio::sync::Mutex::new(()),
            created_at: now,
            last_activity: Mutex::new(now),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        *lock(&self.last_activity)
    }

    pub fn touch(&self) {
        *lock(&self.last_activity) = Utc::now();
    }

    pub fn identity(&self) -> SessionIdentity {
        lock(&self.state).identity()
    }

    pub fn set_identity(&self, identity: SessionIdentity) {
        lock(&self.state).set_identity(identity);
    }

    /// 在状态锁内执行一次短操作
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut state = lock(&self.state);
        f(&mut state)
    }

    /// 领取开始凭证，之前尚未 `begin_run` 的凭证随之失效
    ///
    /// 进行中的 run 不受影响，直到新 run 真正开始
    pub fn prepare_start(&self) -> StartIntent {
        let mut control = lock(&self.control);
        control.generation += 1;
        StartIntent(control.generation)
    }

    /// 凭证是否仍然有效
    pub fn is_pending(&self, intent: StartIntent) -> bool {
        let control = lock(&self.control);
        !control.closed && control.generation == intent.0
    }

    /// 开始新 run：取消旧 run 的令牌，重置状态
    ///
    /// 会话已关闭，或凭证领取后发生过停止/更新的开始请求时返回 `None`
    pub fn begin_run(&self, intent: StartIntent, seeds: Vec<String>) -> Option<RunHandle> {
        let mut control = lock(&self.control);
        if control.closed || control.generation != intent.0 {
            tracing::debug!(session_id = %self.id, "Start request superseded before run began");
            return None;
        }
        control.token.cancel();
        let token = CancellationToken::new();
        control.token = token.clone();

        let ticket = lock(&self.state).start_run(seeds);
        tracing::debug!(session_id = %self.id, run_id = ticket.id(), "Run started");
        Some(RunHandle { ticket, token })
    }

    /// 当前 run 的句柄
    pub fn current_run(&self) -> RunHandle {
        let control = lock(&self.control);
        let ticket = lock(&self.state).current_ticket();
        RunHandle {
            ticket,
            token: control.token.clone(),
        }
    }

    /// 取消当前 run 以及正在解析种子的开始请求，立即返回，不等待进行中的批次
    ///
    /// 返回此前是否有 run 在进行
    pub fn cancel(&self) -> bool {
        let mut control = lock(&self.control);
        control.invalidate_pending();
        let was_running = lock(&self.state).cancel();
        if was_running {
            tracing::debug!(session_id = %self.id, "Run cancelled");
        }
        was_running
    }

    /// 关闭会话：取消一切，之后不再开始新 run
    pub fn close(&self) -> bool {
        let mut control = lock(&self.control);
        control.closed = true;
        control.invalidate_pending();
        lock(&self.state).cancel()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.control).closed
    }

    /// 获取批次闸门（同一会话同时只有一个批次在生产）
    pub async fn batch_gate(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.batch_gate.lock().await
    }
}

impl std::fmt::Debug for DiscoverySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverySession")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::discovery::RunPhase;

    fn start(session: &DiscoverySession, seeds: &[&str]) -> RunHandle {
        let intent = session.prepare_start();
        session
            .begin_run(intent, seeds.iter().map(|s| s.to_string()).collect())
            .unwrap()
    }

    #[test]
    fn test_begin_run_cancels_previous_token() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let first = start(&session, &["A"]);
        let second = start(&session, &["B"]);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_ne!(first.ticket, second.ticket);
        session.with_state(|s| {
            assert!(s.is_live(second.ticket));
            assert!(!s.is_current(first.ticket));
            assert_eq!(s.seeds(), ["B".to_string()]);
        });
    }

    #[test]
    fn test_cancel_returns_to_idle() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let run = start(&session, &["A"]);

        assert!(session.cancel());
        assert!(run.is_cancelled());
        assert_eq!(session.with_state(|s| s.phase()), RunPhase::Idle);
        assert!(!session.cancel());
    }

    #[test]
    fn test_current_run_shares_token() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let run = start(&session, &[]);
        let current = session.current_run();

        assert_eq!(run.ticket, current.ticket);
        session.cancel();
        assert!(current.is_cancelled());
    }

    #[test]
    fn test_stop_before_begin_invalidates_start() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let intent = session.prepare_start();

        assert!(!session.cancel());
        assert!(!session.is_pending(intent));
        assert!(session.begin_run(intent, vec!["A".to_string()]).is_none());
        assert_eq!(session.with_state(|s| s.phase()), RunPhase::Idle);
        assert!(session.with_state(|s| s.seeds().is_empty()));
    }

    #[test]
    fn test_newer_start_supersedes_pending_one() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let older = session.prepare_start();
        let newer = session.prepare_start();

        assert!(session.begin_run(older, vec!["A".to_string()]).is_none());
        let run = session.begin_run(newer, vec!["B".to_string()]).unwrap();
        assert!(session.with_state(|s| s.is_live(run.ticket)));
    }

    #[test]
    fn test_pending_start_keeps_running_run_alive() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let run = start(&session, &["A"]);

        let _intent = session.prepare_start();
        assert!(!run.is_cancelled());
        assert!(session.with_state(|s| s.is_live(run.ticket)));
    }

    #[test]
    fn test_closed_session_never_starts() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let run = start(&session, &["A"]);
        let intent = session.prepare_start();

        assert!(session.close());
        assert!(run.is_cancelled());
        assert!(session.is_closed());
        assert!(session.begin_run(intent, vec!["B".to_string()]).is_none());
        let fresh = session.prepare_start();
        assert!(session.begin_run(fresh, vec!["B".to_string()]).is_none());
    }

    #[tokio::test]
    async fn test_batch_gate_serializes() {
        let session = DiscoverySession::new("s1", SessionIdentity::default());
        let guard = session.batch_gate().await;
        assert!(session.batch_gate.try_lock().is_err());
        drop(guard);
        assert!(session.batch_gate.try_lock().is_ok());
    }
}
