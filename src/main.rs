//! Discoverr - 音乐艺术家推荐会话服务

use std::sync::Arc;

use discoverr::application::discovery::{
    EnrichmentGateway, LibrarySync, SeedResolver, SimilarityExpander,
};
use discoverr::application::ports::{PersonalHistoryPort, PreviewProviderPort};
use discoverr::application::DiscoveryEngine;
use discoverr::config::{load_config, print_config, LogConfig};
use discoverr::domain::discovery::PersonalSource;
use discoverr::infrastructure::adapters::{
    ConfigUserDirectory, DeezerArtwork, ItunesPreview, LastFmClient, LastFmHistory, LidarrClient,
    ListenBrainzHistory, MusicBrainzClient, OpenAiSeedGenerator, YoutubePreview,
};
use discoverr::infrastructure::events::EventPublisher;
use discoverr::infrastructure::http::{
    AddArtistSettings, AppPorts, AppState, HttpServer, ServerConfig,
};
use discoverr::infrastructure::memory::{InMemoryLibraryCache, InMemorySessionManager};
use discoverr::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, SqliteArtistRequestRepository,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("{},discoverr={},tower_http=debug", log.level, log.level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("Discoverr - artist discovery sessions");
    print_config(&config);

    // 初始化数据库
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let pool = create_pool(&config.database).await?;
    run_migrations(&pool).await?;
    let request_repo = Arc::new(SqliteArtistRequestRepository::new(pool));

    // 外部服务适配器
    let lastfm = LastFmClient::new(&config.lastfm)?.arc();
    let musicbrainz = Arc::new(MusicBrainzClient::new(&config.musicbrainz)?);
    let users = Arc::new(ConfigUserDirectory::new(&config.users));

    // 种子解析
    let mut resolver = SeedResolver::new(musicbrainz.clone(), users.clone());
    if config.llm.is_configured() {
        resolver = resolver.with_generator(Arc::new(OpenAiSeedGenerator::new(&config.llm)?));
    }
    if config.lastfm.is_configured() {
        resolver =
            resolver.with_personal_source(PersonalSource::LastFm, LastFmHistory::chain(lastfm.clone()));
    }
    let listenbrainz: Arc<dyn PersonalHistoryPort> =
        Arc::new(ListenBrainzHistory::new(&config.listenbrainz)?);
    resolver = resolver.with_personal_source(PersonalSource::ListenBrainz, vec![listenbrainz]);

    // 曲库快照
    let library = Arc::new(LibrarySync::new(
        Arc::new(LidarrClient::new(&config.lidarr)?),
        InMemoryLibraryCache::new().arc(),
    ));

    // 事件发布器
    let event_publisher = EventPublisher::new().arc();

    let enrichment = EnrichmentGateway::new(lastfm.clone())
        .with_artwork(Arc::new(DeezerArtwork::new(&config.deezer)?));
    let engine = DiscoveryEngine::new(
        resolver,
        SimilarityExpander::new(lastfm.clone()).with_cap(config.discovery.candidate_cap),
        Arc::new(enrichment),
        library.clone(),
        event_publisher.clone(),
    )
    .with_batch_size(config.discovery.batch_size);

    // 试听回退顺序：YouTube（配置了 key 时）-> iTunes
    let mut previews: Vec<Arc<dyn PreviewProviderPort>> = Vec::new();
    if let Some(youtube) = YoutubePreview::new(&config.youtube)? {
        previews.push(Arc::new(youtube));
    }
    previews.push(Arc::new(ItunesPreview::new(&config.itunes)?));

    let ports = AppPorts {
        session_manager: InMemorySessionManager::new().arc(),
        event_publisher,
        users,
        identity: musicbrainz,
        request_repo,
        metadata: lastfm,
        previews,
    };
    let add = AddArtistSettings {
        options: config.lidarr.add_options(),
        fallback_to_top_result: config.musicbrainz.fallback_to_top_result,
    };
    let identity_secret = config.server.identity_secret().map(str::to_string);
    if identity_secret.is_none() {
        tracing::warn!(
            "server.identity_secret is not set, ?user= is trusted as sent; keep the WebSocket behind the auth proxy"
        );
    }
    let state =
        AppState::new(Arc::new(engine), ports, add).with_identity_secret(identity_secret);

    // 预热曲库快照，失败时首次请求会重试
    tokio::spawn(async move {
        if let Err(e) = library.refresh().await {
            tracing::warn!(error = %e, "Initial library load failed");
        }
    });

    let server = HttpServer::new(ServerConfig::from(&config.server), state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
