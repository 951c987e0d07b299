//! 相似度扩展
//!
//! 逐个种子查询相似艺术家图谱，合并、去重、排除曲库与种子，排序后得到候选列表。
//! 单个种子查询失败只记日志，不影响其余种子。

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::application::ports::SimilarArtistProviderPort;
use crate::domain::discovery::{rank_candidates, Candidate, LibrarySnapshot, SimilarityScore};
use crate::domain::name_normalizer::normalize;

/// 候选数量上限
pub const DEFAULT_CANDIDATE_CAP: usize = 500;

/// 扩展结果
#[derive(Debug, Clone, Default)]
pub struct Expansion {
    /// 排序后的候选
    pub candidates: Vec<Candidate>,
    /// 查询失败的种子
    pub failed_seeds: Vec<String>,
    /// 达到上限后未处理的种子数
    pub skipped_seeds: usize,
    /// 是否因取消而提前结束
    pub cancelled: bool,
}

pub struct SimilarityExpander {
    provider: Arc<dyn SimilarArtistProviderPort>,
    cap: usize,
}

impl SimilarityExpander {
    pub fn new(provider: Arc<dyn SimilarArtistProviderPort>) -> Self {
        Self {
            provider,
            cap: DEFAULT_CANDIDATE_CAP,
        }
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// 扩展种子
    ///
    /// 每次图谱查询前检查取消信号；查询返回时若已取消，结果丢弃
    pub async fn expand(
        &self,
        seeds: &[String],
        library: &LibrarySnapshot,
        cancel: &CancellationToken,
    ) -> Expansion {
        let seed_keys: HashSet<String> = seeds.iter().map(|s| normalize(s)).collect();
        let mut accepted: HashSet<String> = HashSet::new();
        let mut expansion = Expansion::default();

        for (index, seed) in seeds.iter().enumerate() {
            if expansion.candidates.len() >= self.cap {
                expansion.skipped_seeds = seeds.len() - index;
                tracing::debug!(cap = self.cap, skipped = expansion.skipped_seeds, "Candidate cap reached");
                break;
            }
            if cancel.is_cancelled() {
                expansion.cancelled = true;
                break;
            }

            let neighbors = match self.provider.neighbors(seed).await {
                Ok(neighbors) => neighbors,
                Err(e) => {
                    tracing::warn!(seed = %seed, error = %e, "Similar artist lookup failed");
                    expansion.failed_seeds.push(seed.clone());
                    continue;
                }
            };

            if cancel.is_cancelled() {
                expansion.cancelled = true;
                break;
            }

            let before = expansion.candidates.len();
            for neighbor in neighbors {
                if expansion.candidates.len() >= self.cap {
                    break;
                }
                let key = normalize(&neighbor.name);
                if key.is_empty()
                    || library.contains_key(&key)
                    || seed_keys.contains(&key)
                    || !accepted.insert(key)
                {
                    continue;
                }
                let score = neighbor.score.and_then(SimilarityScore::coerce);
                expansion
                    .candidates
                    .push(Candidate::new(neighbor.name.trim(), score));
            }

            tracing::debug!(
                seed = %seed,
                accepted = expansion.candidates.len() - before,
                "Seed expanded"
            );
        }

        rank_candidates(&mut expansion.candidates);
        expansion
    }
}
