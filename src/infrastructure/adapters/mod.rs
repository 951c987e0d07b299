//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现：每个外部服务一个模块

mod http_support;

pub mod deezer;
pub mod itunes;
pub mod lastfm;
pub mod lidarr;
pub mod listenbrainz;
pub mod llm;
pub mod musicbrainz;
pub mod user_directory;
pub mod youtube;

pub use deezer::DeezerArtwork;
pub use itunes::ItunesPreview;
pub use lastfm::{LastFmClient, LastFmHistory, LastFmStrategy};
pub use lidarr::LidarrClient;
pub use listenbrainz::ListenBrainzHistory;
pub use llm::OpenAiSeedGenerator;
pub use musicbrainz::MusicBrainzClient;
pub use user_directory::ConfigUserDirectory;
pub use youtube::YoutubePreview;
