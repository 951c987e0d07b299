//! Discovery Context - Entities

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::SimilarityScore;
use crate::domain::name_normalizer::normalize;

/// 占位图片（无封面时使用）
pub const PLACEHOLDER_IMAGE_URL: &str = "https://placehold.co/512x512?text=No+Image";

/// 无流派标签时的默认值
pub const UNKNOWN_GENRE: &str = "Unknown Genre";

/// 候选艺术家 - 相似度扩展的产物，尚未补全元数据
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    /// 规范化名称（排序和去重 key）
    pub key: String,
    pub score: Option<SimilarityScore>,
}

impl Candidate {
    pub fn new(name: impl Into<String>, score: Option<SimilarityScore>) -> Self {
        let name = name.into();
        let key = normalize(&name);
        Self { name, key, score }
    }

    /// 排序用分数，缺失视为 -1（最弱）
    fn rank_score(&self) -> f64 {
        self.score.map(|s| s.value()).unwrap_or(-1.0)
    }
}

/// 候选排序：分数降序，同分按规范化名称字典序
///
/// 全序关系，对已排序列表再次排序结果不变
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.rank_score()
        .total_cmp(&a.rank_score())
        .then_with(|| a.key.cmp(&b.key))
}

/// 对候选列表排序（稳定排序）
pub fn rank_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(rank_order);
}

/// 卡片生命周期状态
///
/// 由加入/申请等操作在卡片发出后更新
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CardStatus {
    #[default]
    #[serde(rename = "")]
    NotRequested,
    #[serde(rename = "Requested")]
    Requested,
    #[serde(rename = "Added")]
    Added,
    #[serde(rename = "Already in Library")]
    AlreadyPresent,
    #[serde(rename = "Invalid Path")]
    InvalidPath,
    #[serde(rename = "Failed to Add")]
    Failed,
}

/// 艺术家卡片 - 推送给客户端的展示单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistCard {
    pub name: String,
    pub genre: String,
    pub image_url: String,
    /// 例如 "Play Count: 1.2M"
    pub popularity: String,
    /// 例如 "Listeners: 340.0K"
    pub listeners: String,
    pub similarity_score: Option<f64>,
    /// 例如 "Similarity: 85.0%"
    pub similarity: Option<String>,
    pub status: CardStatus,
}

impl ArtistCard {
    pub fn key(&self) -> String {
        normalize(&self.name)
    }
}

/// 曲库勾选列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryItem {
    pub name: String,
    pub checked: bool,
}

/// 数字缩写：1_234_567 -> "1.2M"，12_345 -> "12.3K"
pub fn format_count(count: u64) -> String {
    if count >= 1_000_000 {
        format!("{:.1}M", count as f64 / 1_000_000.0)
    } else if count >= 1_000 {
        format!("{:.1}K", count as f64 / 1_000.0)
    } else {
        count.to_string()
    }
}
