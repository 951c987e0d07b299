//! 分批推送
//!
//! 每批从游标处取 `batch_size` 个候选，逐个补全并立即推送。
//! 每张卡片补全前后都检查取消信号，停止请求在一张卡片的延迟内生效。

use std::sync::Arc;

use super::enrichment::EnrichmentGateway;
use super::session::{DiscoverySession, RunHandle};
use crate::application::ports::{DiscoveryEvent, DiscoveryEventSink};
use crate::domain::discovery::{ArtistCard, Candidate};

/// 默认批次大小
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// 批次类型，仅影响完成事件的命名
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Initial,
    LoadMore,
}

/// 批次结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResult {
    pub emitted: Vec<ArtistCard>,
    /// 补全失败的名称
    pub missing: Vec<String>,
    /// 本批消耗的候选数（含跳过与失败）
    pub consumed: usize,
    pub has_more: bool,
    pub cancelled: bool,
}

impl BatchResult {
    fn nothing_more() -> Self {
        Self::default()
    }

    /// 本批尝试过的候选全部补全失败
    pub fn all_missed(&self) -> bool {
        !self.cancelled && self.emitted.is_empty() && !self.missing.is_empty()
    }
}

pub struct PaginationController {
    gateway: Arc<EnrichmentGateway>,
    sink: Arc<dyn DiscoveryEventSink>,
    batch_size: usize,
}

impl PaginationController {
    pub fn new(gateway: Arc<EnrichmentGateway>, sink: Arc<dyn DiscoveryEventSink>) -> Self {
        Self {
            gateway,
            sink,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 生产下一批
    ///
    /// 首批要求 run 仍在进行；"加载更多" 还要求首批已发出且有剩余候选，
    /// 否则不做任何上游调用，直接报告没有更多
    pub async fn produce_next_batch(
        &self,
        session: &DiscoverySession,
        run: &RunHandle,
        kind: BatchKind,
    ) -> BatchResult {
        let _gate = session.batch_gate().await;

        if run.is_cancelled() {
            return BatchResult::nothing_more();
        }

        let slice = session.with_state(|state| {
            let allowed = match kind {
                BatchKind::Initial => state.is_live(run.ticket),
                BatchKind::LoadMore => state.is_current(run.ticket) && state.can_load_more(),
            };
            allowed.then(|| state.next_slice(self.batch_size))
        });
        let Some(slice) = slice else {
            return BatchResult::nothing_more();
        };

        let mut result = self.stream_cards(session, run, &slice).await;
        result.consumed = slice.len();

        let has_more = session.with_state(|state| state.complete_batch(run.ticket, result.consumed));
        result.has_more = has_more && !result.cancelled && !run.is_cancelled();

        tracing::debug!(
            session_id = %session.id(),
            kind = ?kind,
            emitted = result.emitted.len(),
            missing = result.missing.len(),
            has_more = result.has_more,
            cancelled = result.cancelled,
            "Batch produced"
        );
        result
    }

    /// 推送种子卡片（不移动游标）
    pub async fn emit_seed_cards(
        &self,
        session: &DiscoverySession,
        run: &RunHandle,
        seeds: &[String],
    ) -> BatchResult {
        let _gate = session.batch_gate().await;
        let seeds: Vec<Candidate> = seeds.iter().map(|s| Candidate::new(s.as_str(), None)).collect();
        let mut result = self.stream_cards(session, run, &seeds).await;
        result.cancelled |= run.is_cancelled();
        result
    }

    /// 逐个补全并推送，调用方持有批次闸门
    async fn stream_cards(
        &self,
        session: &DiscoverySession,
        run: &RunHandle,
        candidates: &[Candidate],
    ) -> BatchResult {
        let mut result = BatchResult::default();

        for candidate in candidates {
            if run.is_cancelled() {
                result.cancelled = true;
                break;
            }
            if session.with_state(|state| state.is_emitted(&candidate.key)) {
                continue;
            }

            let enriched = self.gateway.enrich(&candidate.name, candidate.score).await;

            if run.is_cancelled() {
                result.cancelled = true;
                break;
            }

            match enriched {
                Ok(card) => {
                    let recorded =
                        session.with_state(|state| state.record_card(run.ticket, card.clone()));
                    if recorded {
                        self.sink
                            .publish(session.id(), DiscoveryEvent::ArtistLoaded(card.clone()));
                        result.emitted.push(card);
                    }
                }
                Err(missing) => result.missing.push(missing.0),
            }
        }

        result
    }
}
