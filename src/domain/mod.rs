//! Domain Layer - 领域层
//!
//! - Discovery Context: 推荐会话、候选、卡片、曲库快照
//! - 名称规范化（所有组件共用）

pub mod discovery;
pub mod name_normalizer;

pub use name_normalizer::{dedupe_names, is_fuzzy_match, normalize, same_artist};
