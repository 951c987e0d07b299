//! Discovery Context - 会话状态机
//!
//! 每个连接一份可变记录。状态转换：
//!
//! ```text
//! Idle --start_run--> Running --complete_batch(has_more=false)--> Idle (Completed)
//!                        |  \--cancel-----------------------------> Idle (Cancelled)
//!                        |   \-fail_run---------------------------> Idle (Failed)
//!                        \--start_run (新 run 取代旧 run)--> Running
//! ```
//!
//! 不变量:
//! - `cursor <= candidates.len()`，且在一次 run 内单调不减
//! - `emitted` 中的规范化名称在一次 run 内至多发出一次
//! - 新 run 开始前清空 candidates / cursor / emitted / delivered
//! - 携带旧 `RunTicket` 的写操作一律被丢弃

use std::collections::HashSet;

use super::{ArtistCard, Candidate, CardStatus, LibraryItem};
use crate::domain::name_normalizer::normalize;

/// 会话运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Running,
}

/// run 的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed,
}

/// run 凭证，标识状态写入属于哪一次 run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// 会话身份（连接时注入）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Option<i64>,
    pub is_admin: bool,
}

/// 会话状态
#[derive(Debug, Clone)]
pub struct SessionState {
    identity: SessionIdentity,
    phase: RunPhase,
    run_id: u64,
    seeds: Vec<String>,
    candidates: Vec<Candidate>,
    cursor: usize,
    emitted: HashSet<String>,
    delivered: Vec<ArtistCard>,
    initial_batch_sent: bool,
    last_outcome: Option<RunOutcome>,
    library_items: Vec<LibraryItem>,
}

impl SessionState {
    pub fn new(identity: SessionIdentity) -> Self {
        Self {
            identity,
            phase: RunPhase::Idle,
            run_id: 0,
            seeds: Vec::new(),
            candidates: Vec::new(),
            cursor: 0,
            emitted: HashSet::new(),
            delivered: Vec::new(),
            initial_batch_sent: false,
            last_outcome: None,
            library_items: Vec::new(),
        }
    }

    // ========== 身份 ==========

    pub fn identity(&self) -> SessionIdentity {
        self.identity
    }

    pub fn set_identity(&mut self, identity: SessionIdentity) {
        self.identity = identity;
    }

    // ========== 状态转换 ==========

    /// 开始新 run：清空上一次 run 的全部结果并进入 Running
    ///
    /// 无论当前处于 Idle 还是 Running 都合法，进行中的 run 会被静默取代
    pub fn start_run(&mut self, seeds: Vec<String>) -> RunTicket {
        self.run_id += 1;
        self.seeds = seeds;
        self.candidates.clear();
        self.cursor = 0;
        self.emitted.clear();
        self.delivered.clear();
        self.initial_batch_sent = false;
        self.last_outcome = None;
        self.phase = RunPhase::Running;
        RunTicket(self.run_id)
    }

    /// 写入排序后的候选列表，每次 run 只构建一次
    pub fn install_candidates(&mut self, ticket: RunTicket, candidates: Vec<Candidate>) -> bool {
        if !self.is_live(ticket) {
            return false;
        }
        self.candidates = candidates;
        self.cursor = 0;
        true
    }

    /// 取消：Running 直接回到 Idle（Cancelled），返回此前是否在运行
    pub fn cancel(&mut self) -> bool {
        if self.phase == RunPhase::Running {
            self.finish(RunOutcome::Cancelled);
            true
        } else {
            false
        }
    }

    /// run 级失败：回到 Idle，已清空的旧结果不会恢复
    pub fn fail_run(&mut self, ticket: RunTicket) {
        if self.is_live(ticket) {
            self.finish(RunOutcome::Failed);
        }
    }

    /// 记录一张已发出的卡片，重复或过期的写入返回 false
    pub fn record_card(&mut self, ticket: RunTicket, card: ArtistCard) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        if !self.emitted.insert(card.key()) {
            return false;
        }
        self.delivered.push(card);
        true
    }

    /// 批次结束：游标前进 `consumed`（跳过/失败的候选同样计入），返回 has_more
    ///
    /// 没有剩余候选时 run 完成并回到 Idle
    pub fn complete_batch(&mut self, ticket: RunTicket, consumed: usize) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.cursor = (self.cursor + consumed).min(self.candidates.len());
        self.initial_batch_sent = true;
        let has_more = self.has_more();
        if !has_more && self.phase == RunPhase::Running {
            self.finish(RunOutcome::Completed);
        }
        has_more
    }

    fn finish(&mut self, outcome: RunOutcome) {
        self.phase = RunPhase::Idle;
        self.last_outcome = Some(outcome);
    }

    // ========== 查询 ==========

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == RunPhase::Running
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome
    }

    pub fn current_ticket(&self) -> RunTicket {
        RunTicket(self.run_id)
    }

    /// ticket 属于当前 run（不论是否已结束）
    pub fn is_current(&self, ticket: RunTicket) -> bool {
        ticket.0 == self.run_id
    }

    /// ticket 属于当前 run 且 run 仍在进行
    pub fn is_live(&self, ticket: RunTicket) -> bool {
        self.is_current(ticket) && self.phase == RunPhase::Running
    }

    pub fn seeds(&self) -> &[String] {
        &self.seeds
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_more(&self) -> bool {
        self.cursor < self.candidates.len()
    }

    pub fn initial_batch_sent(&self) -> bool {
        self.initial_batch_sent
    }

    /// "加载更多" 是否可执行：run 仍在进行、首批已发出、还有剩余候选
    pub fn can_load_more(&self) -> bool {
        self.phase == RunPhase::Running && self.initial_batch_sent && self.has_more()
    }

    /// 从游标开始取下一批候选
    pub fn next_slice(&self, batch_size: usize) -> Vec<Candidate> {
        let start = self.cursor;
        let end = (start + batch_size.max(1)).min(self.candidates.len());
        self.candidates[start..end].to_vec()
    }

    pub fn is_emitted(&self, key: &str) -> bool {
        self.emitted.contains(key)
    }

    pub fn delivered(&self) -> &[ArtistCard] {
        &self.delivered
    }

    // ========== 卡片状态 ==========

    /// 更新已发出卡片的状态，返回更新后的卡片（用于重新推送）
    pub fn update_status(&mut self, name: &str, status: CardStatus) -> Option<ArtistCard> {
        let key = normalize(name);
        let card = self.delivered.iter_mut().find(|c| c.key() == key)?;
        card.status = status;
        Some(card.clone())
    }

    // ========== 曲库勾选列表 ==========

    pub fn library_items(&self) -> &[LibraryItem] {
        &self.library_items
    }

    /// 用新的曲库名称重建勾选列表，保留已勾选状态
    pub fn sync_library_items(&mut self, names: &[String]) {
        let checked: HashSet<&str> = self
            .library_items
            .iter()
            .filter(|i| i.checked)
            .map(|i| i.name.as_str())
            .collect();
        self.library_items = names
            .iter()
            .map(|name| LibraryItem {
                name: name.clone(),
                checked: checked.contains(name.as_str()),
            })
            .collect();
    }

    /// 按选择集合更新勾选状态
    pub fn check_library_items(&mut self, selection: &HashSet<String>) {
        for item in &mut self.library_items {
            item.checked = selection.contains(&item.name);
        }
    }
}
