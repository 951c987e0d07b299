//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::ports::{
    AddArtistOptions, ArtistIdentityPort, ArtistRequestRepositoryPort, DiscoveryEventSink,
    MetadataProviderPort, PreviewProviderPort, SessionManagerPort, UserDirectoryPort,
};
use crate::application::{
    // Command handlers
    AddArtistHandler, CancelDiscoveryHandler, LoadMoreHandler, RefreshLibraryHandler,
    RequestArtistHandler, StartDiscoveryHandler,
    // Query handlers
    ListLibraryHandler, PersonalSourcesHandler, PrehearHandler, PreviewArtistHandler,
    DiscoveryEngine,
};
use crate::infrastructure::events::EventPublisher;

/// 应用状态依赖的端口
pub struct AppPorts {
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub event_publisher: Arc<EventPublisher>,
    pub users: Arc<dyn UserDirectoryPort>,
    pub identity: Arc<dyn ArtistIdentityPort>,
    pub request_repo: Arc<dyn ArtistRequestRepositoryPort>,
    pub metadata: Arc<dyn MetadataProviderPort>,
    pub previews: Vec<Arc<dyn PreviewProviderPort>>,
}

/// 加入曲库的设置
#[derive(Debug, Clone, Default)]
pub struct AddArtistSettings {
    pub options: AddArtistOptions,
    pub fallback_to_top_result: bool,
}

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub session_manager: Arc<dyn SessionManagerPort>,
    pub event_publisher: Arc<EventPublisher>,
    pub users: Arc<dyn UserDirectoryPort>,
    pub engine: Arc<DiscoveryEngine>,
    /// 采信 `?user=` 所需的共享密钥
    pub identity_secret: Option<String>,

    // ========== Command Handlers ==========
    pub start_discovery_handler: StartDiscoveryHandler,
    pub cancel_discovery_handler: CancelDiscoveryHandler,
    pub load_more_handler: LoadMoreHandler,
    pub refresh_library_handler: RefreshLibraryHandler,
    pub add_artist_handler: AddArtistHandler,
    pub request_artist_handler: RequestArtistHandler,

    // ========== Query Handlers ==========
    pub list_library_handler: ListLibraryHandler,
    pub personal_sources_handler: PersonalSourcesHandler,
    pub preview_artist_handler: PreviewArtistHandler,
    pub prehear_handler: PrehearHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(engine: Arc<DiscoveryEngine>, ports: AppPorts, add: AddArtistSettings) -> Self {
        let AppPorts {
            session_manager,
            event_publisher,
            users,
            identity,
            request_repo,
            metadata,
            previews,
        } = ports;
        let sink: Arc<dyn DiscoveryEventSink> = event_publisher.clone();
        let library = engine.library().clone();

        Self {
            // Command handlers
            start_discovery_handler: StartDiscoveryHandler::new(
                engine.clone(),
                session_manager.clone(),
            ),
            cancel_discovery_handler: CancelDiscoveryHandler::new(
                engine.clone(),
                session_manager.clone(),
            ),
            load_more_handler: LoadMoreHandler::new(engine.clone(), session_manager.clone()),
            refresh_library_handler: RefreshLibraryHandler::new(
                library.clone(),
                session_manager.clone(),
                sink.clone(),
            ),
            add_artist_handler: AddArtistHandler::new(
                library.clone(),
                identity,
                session_manager.clone(),
                sink.clone(),
                add.options,
            )
            .with_fallback_to_top_result(add.fallback_to_top_result),
            request_artist_handler: RequestArtistHandler::new(
                request_repo,
                session_manager.clone(),
                sink,
            ),

            // Query handlers
            list_library_handler: ListLibraryHandler::new(library),
            personal_sources_handler: PersonalSourcesHandler::new(
                engine.resolver(),
                users.clone(),
                session_manager.clone(),
            ),
            preview_artist_handler: PreviewArtistHandler::new(metadata.clone()),
            prehear_handler: PrehearHandler::new(metadata, previews),

            // Ports
            session_manager,
            event_publisher,
            users,
            engine,
            identity_secret: None,
        }
    }

    pub fn with_identity_secret(mut self, secret: Option<String>) -> Self {
        self.identity_secret = secret;
        self
    }
}
