//! Discovery Context - 曲库快照

use std::collections::HashSet;

use crate::domain::name_normalizer::normalize;

/// 曲库快照
///
/// 不变量:
/// - `names` 与 `normalized` 描述同一组艺术家
/// - 快照构建后不可变，刷新时整体替换
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    names: Vec<String>,
    normalized: HashSet<String>,
}

impl LibrarySnapshot {
    /// 从曲库列表构建快照，名称按大小写不敏感排序
    pub fn new(mut names: Vec<String>) -> Self {
        names.retain(|n| !n.trim().is_empty());
        names.sort_by_key(|n| n.to_lowercase());
        let normalized = names.iter().map(|n| normalize(n)).collect();
        Self { names, normalized }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// 按规范化名称判断是否已在曲库中
    pub fn contains(&self, name: &str) -> bool {
        self.normalized.contains(&normalize(name))
    }

    /// 按已规范化的 key 判断
    pub fn contains_key(&self, key: &str) -> bool {
        self.normalized.contains(key)
    }

    /// 返回追加了一个艺术家的新快照（原快照不变）
    pub fn with_artist(&self, name: &str) -> Self {
        if self.contains(name) {
            return self.clone();
        }
        let mut names = self.names.clone();
        names.push(name.to_string());
        Self::new(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_sorted_and_normalized() {
        let snapshot = LibrarySnapshot::new(vec![
            "muse".to_string(),
            "Björk".to_string(),
            "Arcade Fire".to_string(),
            " ".to_string(),
        ]);
        assert_eq!(snapshot.names(), &["Arcade Fire", "Björk", "muse"]);
        assert!(snapshot.contains("BJORK"));
        assert!(snapshot.contains_key("arcade fire"));
        assert!(!snapshot.contains("Coldplay"));
    }

    #[test]
    fn test_with_artist_copies() {
        let snapshot = LibrarySnapshot::new(vec!["Muse".to_string()]);
        let next = snapshot.with_artist("Coldplay");
        assert_eq!(snapshot.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(next.with_artist("coldplay").len(), 2);
    }
}
