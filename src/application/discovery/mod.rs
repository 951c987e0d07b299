//! Discovery Engine - 推荐会话引擎
//!
//! - session: 每个连接的并发会话句柄
//! - seed_resolver: 种子解析
//! - similarity_expander: 相似度扩展与排序
//! - enrichment: 元数据补全
//! - pagination: 分批推送与取消
//! - engine: 编排
//! - fallback: 有序回退链

mod engine;
mod enrichment;
mod fallback;
mod library_sync;
mod pagination;
mod seed_resolver;
mod session;
mod similarity_expander;

pub use engine::{DiscoveryEngine, RunSummary};
pub use enrichment::{EnrichmentGateway, MissingMetadata};
pub use fallback::{Attempt, FallbackChain};
pub use library_sync::LibrarySync;
pub use pagination::{BatchKind, BatchResult, PaginationController, DEFAULT_BATCH_SIZE};
pub use seed_resolver::{ResolvedSeeds, SeedResolver};
pub use session::{DiscoverySession, RunHandle, StartIntent};
pub use similarity_expander::{Expansion, SimilarityExpander, DEFAULT_CANDIDATE_CAP};
