//! 艺术家名称规范化
//!
//! 音译 + 大小写折叠 + 去除首尾空白，用于判断两个名称是否为同一艺术家。
//! "Sigur Rós" 与 "sigur ros" 规范化后相等。

use std::collections::HashSet;

use deunicode::deunicode_with_tofu;
use strsim::normalized_levenshtein;

/// 模糊匹配阈值（0-100）
pub const FUZZY_MATCH_THRESHOLD: f64 = 90.0;

/// 计算名称的规范化 key
///
/// 纯函数、全函数（不会失败）、幂等：`normalize(&normalize(x)) == normalize(x)`
pub fn normalize(name: &str) -> String {
    deunicode_with_tofu(name, "")
        .to_ascii_lowercase()
        .trim()
        .to_string()
}

/// 两个名称是否指向同一艺术家
pub fn same_artist(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// 按规范化 key 去重，保留首次出现的原始写法
///
/// 空白名称会被丢弃，保留的名称去除首尾空白
pub fn dedupe_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut deduped = Vec::new();

    for name in names {
        let cleaned = name.as_ref().trim();
        if cleaned.is_empty() {
            continue;
        }
        if seen.insert(normalize(cleaned)) {
            deduped.push(cleaned.to_string());
        }
    }

    deduped
}

/// 两个名称的相似度（0-100），分别比较小写原文与规范化形式，取较高者
pub fn fuzzy_ratio(a: &str, b: &str) -> f64 {
    let raw = normalized_levenshtein(&a.trim().to_lowercase(), &b.trim().to_lowercase());
    let folded = normalized_levenshtein(&normalize(a), &normalize(b));
    raw.max(folded) * 100.0
}

/// 模糊匹配：相似度严格大于阈值
pub fn is_fuzzy_match(a: &str, b: &str) -> bool {
    fuzzy_ratio(a, b) > FUZZY_MATCH_THRESHOLD
}
