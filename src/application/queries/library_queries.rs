//! Library Queries

/// 列出曲库快照
#[derive(Debug, Clone)]
pub struct ListLibrary;

/// 个人来源状态查询
#[derive(Debug, Clone)]
pub struct GetPersonalSources {
    pub session_id: String,
}
