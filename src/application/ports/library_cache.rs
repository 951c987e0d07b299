//! Library Cache Port - 进程级曲库快照
//!
//! 读多写少，整体替换（copy-and-swap），读者只会看到完整的旧快照或新快照

use std::sync::Arc;

use crate::domain::discovery::LibrarySnapshot;

pub trait LibraryCachePort: Send + Sync {
    /// 当前快照
    fn snapshot(&self) -> Arc<LibrarySnapshot>;

    /// 整体替换
    fn replace(&self, snapshot: LibrarySnapshot);

    /// 加入单个艺术家（同样以替换方式完成）
    fn insert_artist(&self, name: &str);
}
