//! Discovery Context - 推荐发现限界上下文
//!
//! 职责:
//! - 候选艺术家与展示卡片
//! - 曲库快照
//! - 每个连接的会话状态机
//! - 运行级错误分类

mod entities;
mod errors;
mod library;
mod session;
mod value_objects;

pub use entities::{
    format_count, rank_candidates, rank_order, ArtistCard, Candidate, CardStatus, LibraryItem,
    PLACEHOLDER_IMAGE_URL, UNKNOWN_GENRE,
};
pub use errors::{DiscoveryError, ErrorKind};
pub use library::LibrarySnapshot;
pub use session::{RunOutcome, RunPhase, RunTicket, SessionIdentity, SessionState};
pub use value_objects::{PersonalSource, SeedOrigin, SimilarityScore};
