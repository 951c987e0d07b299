//! Artist Queries - 单个艺术家的简介与试听

/// 艺术家简介
#[derive(Debug, Clone)]
pub struct PreviewArtist {
    pub artist_name: String,
}

/// 试听片段
#[derive(Debug, Clone)]
pub struct PrehearArtist {
    pub artist_name: String,
}
