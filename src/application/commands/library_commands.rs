//! Library Commands - 曲库相关命令

use crate::domain::discovery::CardStatus;

/// 刷新曲库快照
#[derive(Debug, Clone)]
pub struct RefreshLibrary;

#[derive(Debug, Clone)]
pub struct RefreshLibraryResponse {
    pub artist_count: usize,
}

/// 把艺术家加入曲库
#[derive(Debug, Clone)]
pub struct AddArtist {
    pub session_id: String,
    pub artist_name: String,
}

#[derive(Debug, Clone)]
pub struct AddArtistResponse {
    pub artist_name: String,
    pub status: CardStatus,
    pub foreign_artist_id: Option<String>,
}

/// 申请加入曲库（需要管理员处理）
#[derive(Debug, Clone)]
pub struct RequestArtist {
    pub session_id: String,
    pub artist_name: String,
}

#[derive(Debug, Clone)]
pub struct RequestArtistResponse {
    pub artist_name: String,
    /// false 表示已有相同的待处理申请
    pub created: bool,
}
