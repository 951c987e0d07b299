//! Discovery Command Handlers

use std::sync::Arc;

use crate::application::commands::discovery_commands::*;
use crate::application::discovery::{DiscoveryEngine, RunSummary};
use crate::application::error::ApplicationError;
use crate::application::ports::SessionManagerPort;

/// StartDiscovery Handler - 解析种子并执行首批
pub struct StartDiscoveryHandler {
    engine: Arc<DiscoveryEngine>,
    session_manager: Arc<dyn SessionManagerPort>,
}

impl StartDiscoveryHandler {
    pub fn new(engine: Arc<DiscoveryEngine>, session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self {
            engine,
            session_manager,
        }
    }

    pub async fn handle(&self, cmd: StartDiscovery) -> Result<RunSummary, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        self.session_manager.touch(&cmd.session_id);

        let result = match &cmd.request {
            DiscoveryRequest::Selection(selection) => {
                self.engine.start_from_selection(&session, selection).await
            }
            DiscoveryRequest::Prompt(prompt) => self.engine.start_from_prompt(&session, prompt).await,
            DiscoveryRequest::Search(query) => self.engine.start_from_search(&session, query).await,
            DiscoveryRequest::PersonalSource(key) => {
                self.engine.start_from_personal_source(&session, key).await
            }
        };

        match &result {
            Ok(summary) => tracing::info!(
                session_id = %cmd.session_id,
                source = %cmd.request.source_key(),
                emitted = summary.emitted,
                has_more = summary.has_more,
                cancelled = summary.cancelled,
                "Discovery request handled"
            ),
            Err(e) => tracing::warn!(
                session_id = %cmd.session_id,
                source = %cmd.request.source_key(),
                error = %e,
                "Discovery request failed"
            ),
        }

        Ok(result?)
    }
}

/// CancelDiscovery Handler - 设置取消信号，立即返回
pub struct CancelDiscoveryHandler {
    engine: Arc<DiscoveryEngine>,
    session_manager: Arc<dyn SessionManagerPort>,
}

impl CancelDiscoveryHandler {
    pub fn new(engine: Arc<DiscoveryEngine>, session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self {
            engine,
            session_manager,
        }
    }

    pub fn handle(&self, cmd: CancelDiscovery) -> Result<CancelDiscoveryResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        let was_running = self.engine.cancel(&session);

        tracing::info!(session_id = %cmd.session_id, was_running = was_running, "Discovery stopped");

        Ok(CancelDiscoveryResponse {
            session_id: cmd.session_id,
            was_running,
        })
    }
}

/// LoadMoreArtists Handler
pub struct LoadMoreHandler {
    engine: Arc<DiscoveryEngine>,
    session_manager: Arc<dyn SessionManagerPort>,
}

impl LoadMoreHandler {
    pub fn new(engine: Arc<DiscoveryEngine>, session_manager: Arc<dyn SessionManagerPort>) -> Self {
        Self {
            engine,
            session_manager,
        }
    }

    pub async fn handle(&self, cmd: LoadMoreArtists) -> Result<RunSummary, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        self.session_manager.touch(&cmd.session_id);
        Ok(self.engine.load_more(&session).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::discovery::{
        EnrichmentGateway, LibrarySync, SeedResolver, SimilarityExpander,
    };
    use crate::application::ports::{ArtistMetadata, SimilarArtist};
    use crate::application::test_support::{
        FakeLibraryCache, FakeLibraryClient, FakeMetadata, FakeSearch, FakeSessionManager,
        FakeSimilarArtists, FakeUserDirectory, RecordingSink,
    };
    use crate::domain::discovery::{DiscoveryError, SessionIdentity};

    fn engine(sink: Arc<RecordingSink>) -> Arc<DiscoveryEngine> {
        let graph = FakeSimilarArtists::new().with(
            "Bonobo",
            vec![
                SimilarArtist::new("Tycho", Some(0.9)),
                SimilarArtist::new("Emancipator", Some(0.8)),
            ],
        );
        let metadata = ["Bonobo", "Tycho", "Emancipator"]
            .iter()
            .fold(FakeMetadata::new(), |fake, name| {
                fake.with(
                    name,
                    ArtistMetadata {
                        name: name.to_string(),
                        ..Default::default()
                    },
                )
            });
        let resolver = SeedResolver::new(
            Arc::new(FakeSearch::returning(&["Bonobo"])),
            Arc::new(FakeUserDirectory::default()),
        );
        let library = LibrarySync::new(
            Arc::new(FakeLibraryClient::with_artists(&["Air"])),
            Arc::new(FakeLibraryCache::default()),
        );
        Arc::new(
            DiscoveryEngine::new(
                resolver,
                SimilarityExpander::new(Arc::new(graph)),
                Arc::new(EnrichmentGateway::new(Arc::new(metadata))),
                Arc::new(library),
                sink,
            )
            .with_batch_size(1),
        )
    }

    #[tokio::test]
    async fn test_start_load_more_and_stop() {
        let sink = Arc::new(RecordingSink::default());
        let engine = engine(sink.clone());
        let sessions = Arc::new(FakeSessionManager::default());
        sessions.open("c1", SessionIdentity::default());

        let start = StartDiscoveryHandler::new(engine.clone(), sessions.clone());
        let load_more = LoadMoreHandler::new(engine.clone(), sessions.clone());
        let stop = CancelDiscoveryHandler::new(engine, sessions);

        let summary = start
            .handle(StartDiscovery {
                session_id: "c1".to_string(),
                request: DiscoveryRequest::Search("bonobo".to_string()),
            })
            .await
            .unwrap();
        assert!(summary.has_more);

        let summary = load_more
            .handle(LoadMoreArtists {
                session_id: "c1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(summary.emitted, 1);
        assert!(summary.has_more);

        let response = stop
            .handle(CancelDiscovery {
                session_id: "c1".to_string(),
            })
            .unwrap();
        assert!(response.was_running);

        let summary = load_more
            .handle(LoadMoreArtists {
                session_id: "c1".to_string(),
            })
            .await
            .unwrap();
        assert!(!summary.has_more);
        assert_eq!(sink.cards(), vec!["Bonobo", "Tycho"]);
    }

    #[tokio::test]
    async fn test_errors_are_typed() {
        let sink = Arc::new(RecordingSink::default());
        let sessions = Arc::new(FakeSessionManager::default());
        sessions.open("c1", SessionIdentity::default());
        let start = StartDiscoveryHandler::new(engine(sink), sessions);

        let err = start
            .handle(StartDiscovery {
                session_id: "c1".to_string(),
                request: DiscoveryRequest::Prompt("chill".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Discovery(DiscoveryError::GeneratorUnavailable)
        ));

        let err = start
            .handle(StartDiscovery {
                session_id: "missing".to_string(),
                request: DiscoveryRequest::Search("x".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::NotFound { .. }));
    }

    #[test]
    fn test_source_key() {
        assert_eq!(DiscoveryRequest::PersonalSource(String::new()).source_key(), "lastfm");
        assert_eq!(
            DiscoveryRequest::PersonalSource("ListenBrainz".to_string()).source_key(),
            "listenbrainz"
        );
        assert_eq!(DiscoveryRequest::Selection(vec![]).source_key(), "selection");
    }
}
