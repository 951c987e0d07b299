//! Discovery Context - Value Objects

use serde::{Deserialize, Serialize};

/// 相似度分数，取值范围 [0, 1]
///
/// 上游给出的值先被强制转换：非有限值视为缺失，越界值截断到区间内
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SimilarityScore(f64);

impl SimilarityScore {
    /// 从上游原始值构造，无效值返回 None
    pub fn coerce(raw: f64) -> Option<Self> {
        if !raw.is_finite() {
            return None;
        }
        Some(Self(raw.clamp(0.0, 1.0)))
    }

    /// 从字符串解析（Last.fm 以字符串返回 match 值）
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().and_then(Self::coerce)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// 展示用标签，例如 "Similarity: 85.0%"
    pub fn label(&self) -> String {
        format!("Similarity: {:.1}%", self.0 * 100.0)
    }
}

/// 个人听歌历史来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersonalSource {
    LastFm,
    ListenBrainz,
}

impl PersonalSource {
    pub const ALL: [PersonalSource; 2] = [PersonalSource::LastFm, PersonalSource::ListenBrainz];

    /// 解析客户端传入的来源 key，空字符串默认为 Last.fm
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_lowercase().as_str() {
            "" | "lastfm" => Some(PersonalSource::LastFm),
            "listenbrainz" => Some(PersonalSource::ListenBrainz),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonalSource::LastFm => "lastfm",
            PersonalSource::ListenBrainz => "listenbrainz",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PersonalSource::LastFm => "Last.fm",
            PersonalSource::ListenBrainz => "ListenBrainz",
        }
    }
}

impl std::fmt::Display for PersonalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 种子来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOrigin {
    /// 从曲库勾选
    Selection,
    /// 自由文本提示（LLM）
    Prompt,
    /// 关键字搜索
    Search,
    /// 个人听歌历史
    Personal {
        source: PersonalSource,
        username: String,
    },
}

impl SeedOrigin {
    pub fn key(&self) -> &'static str {
        match self {
            SeedOrigin::Selection => "selection",
            SeedOrigin::Prompt => "prompt",
            SeedOrigin::Search => "search",
            SeedOrigin::Personal { source, .. } => source.as_str(),
        }
    }

    /// 日志及提示信息中使用的来源名称
    pub fn label(&self) -> &'static str {
        match self {
            SeedOrigin::Selection => "Library",
            SeedOrigin::Prompt => "AI",
            SeedOrigin::Search => "MusicBrainz",
            SeedOrigin::Personal { source, .. } => source.label(),
        }
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            SeedOrigin::Personal { username, .. } => Some(username),
            _ => None,
        }
    }
}
