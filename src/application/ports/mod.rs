//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artist_catalog;
mod event_sink;
mod library_cache;
mod library_client;
mod metadata_provider;
mod personal_history;
mod preview_provider;
mod provider_error;
mod repositories;
mod seed_generator;
mod session_manager;
mod similar_artists;
mod user_directory;

pub use artist_catalog::{ArtistIdentityPort, CatalogArtist, KeywordSearchPort};
pub use event_sink::{DiscoveryEvent, DiscoveryEventSink};
pub use library_cache::LibraryCachePort;
pub use library_client::{AddArtistOptions, AddArtistOutcome, AddArtistRequest, LibraryClientPort};
pub use metadata_provider::{
    ArtistBiography, ArtistMetadata, ArtworkProviderPort, MetadataProviderPort,
};
pub use personal_history::PersonalHistoryPort;
pub use preview_provider::{AudioPreview, PreviewProviderPort};
pub use provider_error::ProviderError;
pub use repositories::{
    ArtistRequestRecord, ArtistRequestRepositoryPort, RepositoryError, RequestStatus,
};
pub use seed_generator::SeedGeneratorPort;
pub use session_manager::{SessionError, SessionManagerPort};
pub use similar_artists::{SimilarArtist, SimilarArtistProviderPort};
pub use user_directory::{UserDirectoryPort, UserProfile};
