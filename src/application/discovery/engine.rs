//! 推荐引擎 - 编排一次完整的 run
//!
//! 种子解析 -> 开始 run -> 相似度扩展（每次 run 一次）-> 分批补全推送。
//! run 级错误以 `Err` 返回，由调用方推送给客户端；单元级失败降级为提示。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use super::enrichment::EnrichmentGateway;
use super::library_sync::LibrarySync;
use super::pagination::{BatchKind, BatchResult, PaginationController};
use super::seed_resolver::{ResolvedSeeds, SeedResolver};
use super::session::{DiscoverySession, RunHandle, StartIntent};
use super::similarity_expander::SimilarityExpander;
use crate::application::ports::{DiscoveryEvent, DiscoveryEventSink};
use crate::domain::discovery::{DiscoveryError, LibrarySnapshot, SeedOrigin};

/// 一次调用的结果摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub emitted: usize,
    pub has_more: bool,
    pub cancelled: bool,
}

impl RunSummary {
    fn cancelled() -> Self {
        Self {
            cancelled: true,
            ..Default::default()
        }
    }
}

pub struct DiscoveryEngine {
    resolver: SeedResolver,
    expander: SimilarityExpander,
    paginator: PaginationController,
    library: Arc<LibrarySync>,
    sink: Arc<dyn DiscoveryEventSink>,
}

impl DiscoveryEngine {
    pub fn new(
        resolver: SeedResolver,
        expander: SimilarityExpander,
        enrichment: Arc<EnrichmentGateway>,
        library: Arc<LibrarySync>,
        sink: Arc<dyn DiscoveryEventSink>,
    ) -> Self {
        Self {
            resolver,
            expander,
            paginator: PaginationController::new(enrichment, sink.clone()),
            library,
            sink,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.paginator = self.paginator.with_batch_size(batch_size);
        self
    }

    pub fn resolver(&self) -> &SeedResolver {
        &self.resolver
    }

    pub fn library(&self) -> &Arc<LibrarySync> {
        &self.library
    }

    // ========== 入口 ==========

    /// 从曲库勾选开始
    pub async fn start_from_selection(
        &self,
        session: &DiscoverySession,
        selection: &[String],
    ) -> Result<RunSummary, DiscoveryError> {
        let intent = session.prepare_start();
        let snapshot = self.library.ensure_loaded().await?;
        let listing = session.with_state(|state| {
            if state.library_items().is_empty() {
                state.sync_library_items(snapshot.names());
            }
            state
                .library_items()
                .iter()
                .map(|item| item.name.clone())
                .collect::<Vec<_>>()
        });

        let seeds = match self.resolver.from_selection(selection, &listing) {
            Ok(seeds) => seeds,
            Err(e) => {
                self.publish_library(session);
                return Err(e);
            }
        };

        let Some(run) = session.begin_run(intent, seeds.clone()) else {
            return Ok(RunSummary::cancelled());
        };
        let selected: HashSet<String> = selection.iter().cloned().collect();
        session.with_state(|state| state.check_library_items(&selected));
        tracing::info!(
            session_id = %session.id(),
            run_id = run.ticket.id(),
            source = SeedOrigin::Selection.key(),
            seeds = seeds.len(),
            "Discovery run started"
        );

        self.publish_library(session);
        self.publish(session, DiscoveryEvent::Clear);

        if !self.expand(session, &run, &seeds, &snapshot).await {
            return Ok(RunSummary::cancelled());
        }

        let batch = self
            .paginator
            .produce_next_batch(session, &run, BatchKind::Initial)
            .await;
        self.finish_batch(session, batch, BatchKind::Initial)
    }

    /// 从自由文本开始
    pub async fn start_from_prompt(
        &self,
        session: &DiscoverySession,
        prompt: &str,
    ) -> Result<RunSummary, DiscoveryError> {
        let intent = session.prepare_start();
        let snapshot = self.library.best_effort().await;
        let resolved = self.resolver.from_prompt(prompt, &snapshot).await;
        self.run_resolved(session, intent, resolved, &snapshot).await
    }

    /// 从关键字搜索开始
    pub async fn start_from_search(
        &self,
        session: &DiscoverySession,
        query: &str,
    ) -> Result<RunSummary, DiscoveryError> {
        let intent = session.prepare_start();
        let snapshot = self.library.best_effort().await;
        let resolved = self.resolver.from_search(query, &snapshot).await;
        self.run_resolved(session, intent, resolved, &snapshot).await
    }

    /// 从个人听歌历史开始
    pub async fn start_from_personal_source(
        &self,
        session: &DiscoverySession,
        source_key: &str,
    ) -> Result<RunSummary, DiscoveryError> {
        let intent = session.prepare_start();
        let snapshot = self.library.best_effort().await;
        let resolved = self
            .resolver
            .from_personal(source_key, session.identity(), &snapshot)
            .await;
        self.run_resolved(session, intent, resolved, &snapshot).await
    }

    /// 取消，立即返回
    pub fn cancel(&self, session: &DiscoverySession) -> bool {
        let was_running = session.cancel();
        self.publish_library(session);
        was_running
    }

    /// 加载更多
    pub async fn load_more(&self, session: &DiscoverySession) -> Result<RunSummary, DiscoveryError> {
        let run = session.current_run();
        let batch = self
            .paginator
            .produce_next_batch(session, &run, BatchKind::LoadMore)
            .await;
        self.finish_batch(session, batch, BatchKind::LoadMore)
    }

    // ========== 内部 ==========

    /// 提示词 / 搜索 / 个人历史：先确认种子并推送种子卡片，再扩展
    async fn run_resolved(
        &self,
        session: &DiscoverySession,
        intent: StartIntent,
        resolved: Result<ResolvedSeeds, DiscoveryError>,
        snapshot: &LibrarySnapshot,
    ) -> Result<RunSummary, DiscoveryError> {
        // 解析期间已停止或断开：结果（包括失败）一律丢弃
        if !session.is_pending(intent) {
            tracing::debug!(session_id = %session.id(), "Seeds resolved after stop, run dropped");
            return Ok(RunSummary::cancelled());
        }
        let ResolvedSeeds {
            origin,
            seeds,
            skipped,
        } = resolved?;
        let Some(run) = session.begin_run(intent, seeds.clone()) else {
            return Ok(RunSummary::cancelled());
        };

        self.publish(
            session,
            DiscoveryEvent::SeedsAccepted {
                source: origin.key().to_string(),
                username: origin.username().map(str::to_string),
                seeds: seeds.clone(),
                skipped,
            },
        );

        tracing::info!(
            session_id = %session.id(),
            run_id = run.ticket.id(),
            source = origin.key(),
            seeds = seeds.len(),
            "Discovery run started"
        );
        self.publish_library(session);
        self.publish(session, DiscoveryEvent::Clear);

        let seed_cards = self.paginator.emit_seed_cards(session, &run, &seeds).await;
        if seed_cards.cancelled {
            return Ok(RunSummary::cancelled());
        }
        if seed_cards.emitted.is_empty() {
            session.with_state(|state| state.fail_run(run.ticket));
            self.publish_library(session);
            return Err(DiscoveryError::NoArtistsResolved);
        }
        self.publish_missing(session, &seed_cards.missing);

        if !self.expand(session, &run, &seeds, snapshot).await {
            return Ok(RunSummary::cancelled());
        }

        Ok(self.complete_seed_phase(session, &run, seed_cards.emitted.len()))
    }

    /// 种子卡片充当首批，候选通过 "加载更多" 消费
    ///
    /// run 已被取代或取消时不推送任何事件
    fn complete_seed_phase(
        &self,
        session: &DiscoverySession,
        run: &RunHandle,
        emitted: usize,
    ) -> RunSummary {
        let (current, has_more) = session.with_state(|state| {
            let current = state.is_current(run.ticket);
            (current, state.complete_batch(run.ticket, 0))
        });
        if !current || run.is_cancelled() {
            tracing::debug!(session_id = %session.id(), run_id = run.ticket.id(), "Stale run finished");
            return RunSummary::cancelled();
        }
        self.publish(session, DiscoveryEvent::InitialLoadComplete { has_more });
        if !has_more {
            self.publish_library(session);
        }

        RunSummary {
            emitted,
            has_more,
            cancelled: false,
        }
    }

    /// 扩展并写入候选，run 已被取消或取代时返回 false
    async fn expand(
        &self,
        session: &DiscoverySession,
        run: &RunHandle,
        seeds: &[String],
        snapshot: &LibrarySnapshot,
    ) -> bool {
        let start = Instant::now();
        let expansion = self.expander.expand(seeds, snapshot, &run.token).await;
        if expansion.cancelled || run.is_cancelled() {
            tracing::debug!(session_id = %session.id(), "Expansion abandoned");
            return false;
        }

        if !expansion.failed_seeds.is_empty() {
            tracing::warn!(
                session_id = %session.id(),
                failed = expansion.failed_seeds.len(),
                "Some seeds could not be expanded"
            );
        }

        let count = expansion.candidates.len();
        let installed =
            session.with_state(|state| state.install_candidates(run.ticket, expansion.candidates));
        tracing::info!(
            session_id = %session.id(),
            candidates = count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Candidates ranked"
        );
        installed
    }

    fn finish_batch(
        &self,
        session: &DiscoverySession,
        batch: BatchResult,
        kind: BatchKind,
    ) -> Result<RunSummary, DiscoveryError> {
        if batch.cancelled {
            return Ok(RunSummary::cancelled());
        }

        self.publish_missing(session, &batch.missing);
        let has_more = batch.has_more;
        let event = match kind {
            BatchKind::Initial => DiscoveryEvent::InitialLoadComplete { has_more },
            BatchKind::LoadMore => DiscoveryEvent::LoadMoreComplete { has_more },
        };
        self.publish(session, event);
        if !has_more {
            self.publish_library(session);
        }

        if batch.all_missed() {
            return Err(DiscoveryError::NoArtistsResolved);
        }

        Ok(RunSummary {
            emitted: batch.emitted.len(),
            has_more,
            cancelled: false,
        })
    }

    fn publish_missing(&self, session: &DiscoverySession, missing: &[String]) {
        if missing.is_empty() {
            return;
        }
        tracing::warn!(session_id = %session.id(), missing = ?missing, "Artists without metadata");
        self.publish(
            session,
            DiscoveryEvent::notice(
                "Missing Artists",
                format!("Could not load: {}", missing.join(", ")),
            ),
        );
    }

    /// 推送勾选列表与运行状态
    pub fn publish_library(&self, session: &DiscoverySession) {
        let (artists, running) =
            session.with_state(|state| (state.library_items().to_vec(), state.is_running()));
        self.publish(session, DiscoveryEvent::LibraryUpdate { artists, running });
    }

    fn publish(&self, session: &DiscoverySession, event: DiscoveryEvent) {
        self.sink.publish(session.id(), event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ArtistMetadata, ProviderError, SimilarArtist, UserProfile};
    use crate::application::test_support::{
        FakeGenerator, FakeHistory, FakeLibraryCache, FakeLibraryClient, FakeMetadata,
        FakeSearch, FakeSimilarArtists, FakeUserDirectory, RecordingSink,
    };
    use crate::domain::discovery::{PersonalSource, RunOutcome, RunPhase, SessionIdentity};

    struct Harness {
        engine: DiscoveryEngine,
        sink: Arc<RecordingSink>,
        metadata: Arc<FakeMetadata>,
    }

    fn metadata_for(names: &[&str]) -> FakeMetadata {
        names.iter().fold(FakeMetadata::new(), |fake, name| {
            fake.with(
                name,
                ArtistMetadata {
                    name: name.to_string(),
                    tags: Some(vec!["rock".to_string()]),
                    listener_count: Some(10),
                    play_count: Some(20),
                    image_url: None,
                },
            )
        })
    }

    fn harness(graph: FakeSimilarArtists, metadata: FakeMetadata, batch_size: usize) -> Harness {
        harness_with(
            graph,
            metadata,
            batch_size,
            FakeGenerator::returning(&["Air", "Muse"]),
        )
    }

    fn harness_with(
        graph: FakeSimilarArtists,
        metadata: FakeMetadata,
        batch_size: usize,
        generator: FakeGenerator,
    ) -> Harness {
        let sink = Arc::new(RecordingSink::default());
        let metadata = Arc::new(metadata);
        let users = FakeUserDirectory::with(vec![UserProfile {
            id: 7,
            username: "bob".to_string(),
            lastfm_username: Some("bob_fm".to_string()),
            ..Default::default()
        }]);
        let resolver = SeedResolver::new(Arc::new(FakeSearch::returning(&["Bonobo"])), Arc::new(users))
            .with_generator(Arc::new(generator))
            .with_personal_source(
                PersonalSource::LastFm,
                vec![Arc::new(FakeHistory::returning("top", &["Moby"]))],
            );
        let library = Arc::new(LibrarySync::new(
            Arc::new(FakeLibraryClient::with_artists(&["Muse", "Radiohead", "Portishead"])),
            Arc::new(FakeLibraryCache::default()),
        ));
        let engine = DiscoveryEngine::new(
            resolver,
            SimilarityExpander::new(Arc::new(graph)),
            Arc::new(EnrichmentGateway::new(metadata.clone())),
            library,
            sink.clone(),
        )
        .with_batch_size(batch_size);

        Harness {
            engine,
            sink,
            metadata,
        }
    }

    fn neighbors(names: &[(&str, f64)]) -> Vec<SimilarArtist> {
        names
            .iter()
            .map(|(n, s)| SimilarArtist::new(*n, Some(*s)))
            .collect()
    }

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn session() -> DiscoverySession {
        DiscoverySession::new(
            "conn-1",
            SessionIdentity {
                user_id: Some(7),
                is_admin: false,
            },
        )
    }

    #[tokio::test]
    async fn test_selection_run_pages_through_candidates() {
        let graph = FakeSimilarArtists::new().with(
            "Radiohead",
            neighbors(&[("Muse", 0.9), ("Coldplay", 0.8), ("Keane", 0.7), ("Travis", 0.6)]),
        );
        let h = harness(graph, metadata_for(&["Coldplay", "Keane", "Travis"]), 2);
        let session = session();

        let summary = h
            .engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap();
        assert_eq!(summary.emitted, 2);
        assert!(summary.has_more);
        assert_eq!(h.sink.cards(), vec!["Coldplay", "Keane"]);
        assert!(h.sink.contains(&DiscoveryEvent::Clear));
        assert!(h
            .sink
            .contains(&DiscoveryEvent::InitialLoadComplete { has_more: true }));
        assert!(session.with_state(|s| s
            .library_items()
            .iter()
            .any(|i| i.name == "Radiohead" && i.checked)));

        let summary = h.engine.load_more(&session).await.unwrap();
        assert_eq!(summary.emitted, 1);
        assert!(!summary.has_more);
        assert!(h
            .sink
            .contains(&DiscoveryEvent::LoadMoreComplete { has_more: false }));
        assert_eq!(session.with_state(|s| s.last_outcome()), Some(RunOutcome::Completed));

        let summary = h.engine.load_more(&session).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(h.sink.cards(), vec!["Coldplay", "Keane", "Travis"]);
    }

    #[tokio::test]
    async fn test_selection_without_matches_rerenders_library() {
        let h = harness(FakeSimilarArtists::new(), metadata_for(&[]), 10);
        let session = session();

        let err = h
            .engine
            .start_from_selection(&session, &strings(&["Nobody"]))
            .await
            .unwrap_err();

        assert_eq!(err, DiscoveryError::NoSeedsSelected);
        assert_eq!(session.with_state(|s| s.phase()), RunPhase::Idle);
        let update = h.sink.last_library_update().unwrap();
        assert_eq!(update.0.len(), 3);
        assert!(!update.1);
    }

    #[tokio::test]
    async fn test_prompt_run_emits_seed_cards_first() {
        let graph = FakeSimilarArtists::new().with("Air", neighbors(&[("Moby", 0.8), ("Muse", 0.7)]));
        let h = harness(graph, metadata_for(&["Air", "Moby"]), 10);
        let session = session();

        let summary = h.engine.start_from_prompt(&session, "french chill").await.unwrap();

        assert_eq!(summary.emitted, 1);
        assert!(summary.has_more);
        assert_eq!(h.sink.cards(), vec!["Air"]);
        assert!(h.sink.contains(&DiscoveryEvent::SeedsAccepted {
            source: "prompt".to_string(),
            username: None,
            seeds: strings(&["Air"]),
            skipped: strings(&["Muse"]),
        }));
        assert!(h
            .sink
            .contains(&DiscoveryEvent::InitialLoadComplete { has_more: true }));

        let summary = h.engine.load_more(&session).await.unwrap();
        assert_eq!(summary.emitted, 1);
        assert_eq!(h.sink.cards(), vec!["Air", "Moby"]);
    }

    #[tokio::test]
    async fn test_prompt_run_with_unresolvable_seeds_fails() {
        let h = harness(FakeSimilarArtists::new(), metadata_for(&[]), 10);
        let session = session();

        let err = h.engine.start_from_prompt(&session, "x").await.unwrap_err();

        assert_eq!(err, DiscoveryError::NoArtistsResolved);
        assert_eq!(session.with_state(|s| s.last_outcome()), Some(RunOutcome::Failed));
    }

    #[tokio::test]
    async fn test_failed_start_leaves_previous_run_untouched() {
        let graph = FakeSimilarArtists::new().with("Radiohead", neighbors(&[("Keane", 0.7)]));
        let h = harness(graph, metadata_for(&["Keane"]), 10);
        let session = session();
        h.engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap();

        let err = h.engine.start_from_prompt(&session, "   ").await.unwrap_err();

        assert_eq!(err, DiscoveryError::EmptyInput("prompt"));
        assert_eq!(session.with_state(|s| s.delivered().len()), 1);
    }

    #[tokio::test]
    async fn test_personal_run_acknowledges_username() {
        let graph = FakeSimilarArtists::new().with("Moby", neighbors(&[("Air", 0.5)]));
        let h = harness(graph, metadata_for(&["Moby", "Air"]), 10);
        let session = session();

        h.engine
            .start_from_personal_source(&session, "lastfm")
            .await
            .unwrap();

        assert!(h.sink.contains(&DiscoveryEvent::SeedsAccepted {
            source: "lastfm".to_string(),
            username: Some("bob_fm".to_string()),
            seeds: strings(&["Moby"]),
            skipped: vec![],
        }));
    }

    #[tokio::test]
    async fn test_search_run_with_no_candidates_completes() {
        let h = harness(FakeSimilarArtists::new(), metadata_for(&["Bonobo"]), 10);
        let session = session();

        let summary = h.engine.start_from_search(&session, "bonobo").await.unwrap();

        assert!(!summary.has_more);
        assert!(h
            .sink
            .contains(&DiscoveryEvent::InitialLoadComplete { has_more: false }));
        assert_eq!(session.with_state(|s| s.phase()), RunPhase::Idle);
    }

    #[tokio::test]
    async fn test_cancel_during_initial_batch() {
        let graph = FakeSimilarArtists::new().with(
            "Radiohead",
            neighbors(&[("A", 0.9), ("B", 0.8), ("C", 0.7)]),
        );
        let h = harness(graph, metadata_for(&["A", "B", "C"]), 10);
        let session = Arc::new(session());
        h.metadata.on_call("B", {
            let session = session.clone();
            move || {
                session.cancel();
            }
        });

        let summary = h
            .engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(h.sink.cards(), vec!["A"]);
        assert_eq!(session.with_state(|s| s.last_outcome()), Some(RunOutcome::Cancelled));

        let summary = h.engine.load_more(&session).await.unwrap();
        assert_eq!(summary, RunSummary::default());
        assert_eq!(h.sink.cards(), vec!["A"]);
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_results() {
        let graph = FakeSimilarArtists::new()
            .with("Radiohead", neighbors(&[("Keane", 0.7)]))
            .with("Portishead", neighbors(&[("Massive Attack", 0.9)]));
        let h = harness(graph, metadata_for(&["Keane", "Massive Attack"]), 10);
        let session = session();

        h.engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap();
        h.engine
            .start_from_selection(&session, &strings(&["Portishead"]))
            .await
            .unwrap();

        let delivered: Vec<String> =
            session.with_state(|s| s.delivered().iter().map(|c| c.name.clone()).collect());
        assert_eq!(delivered, strings(&["Massive Attack"]));
        assert_eq!(session.with_state(|s| s.seeds().to_vec()), strings(&["Portishead"]));
    }

    #[tokio::test]
    async fn test_all_missed_batch_reports_no_artists() {
        let graph = FakeSimilarArtists::new().with("Radiohead", neighbors(&[("Ghost", 0.7)]));
        let h = harness(graph, metadata_for(&[]), 10);
        let session = session();

        let err = h
            .engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap_err();

        assert_eq!(err, DiscoveryError::NoArtistsResolved);
        assert!(h.sink.notices().iter().any(|m| m.contains("Ghost")));
    }

    #[tokio::test]
    async fn test_stop_while_resolving_starts_no_run() {
        let graph = FakeSimilarArtists::new().with("Air", neighbors(&[("Moby", 0.8)]));
        let session = Arc::new(session());
        let generator = FakeGenerator::returning(&["Air"]).on_call({
            let session = session.clone();
            move || {
                session.cancel();
            }
        });
        let h = harness_with(graph, metadata_for(&["Air", "Moby"]), 10, generator);

        let summary = h.engine.start_from_prompt(&session, "french chill").await.unwrap();

        assert!(summary.cancelled);
        assert!(h.sink.cards().is_empty());
        assert!(!h.sink.contains(&DiscoveryEvent::Clear));
        assert!(h.metadata.calls().is_empty());
        assert_eq!(session.with_state(|s| s.phase()), RunPhase::Idle);
        assert!(session.with_state(|s| s.seeds().is_empty()));
    }

    #[tokio::test]
    async fn test_close_while_resolving_starts_no_run() {
        let graph = FakeSimilarArtists::new().with("Air", neighbors(&[("Moby", 0.8)]));
        let session = Arc::new(session());
        let generator = FakeGenerator::returning(&["Air"]).on_call({
            let session = session.clone();
            move || {
                session.close();
            }
        });
        let h = harness_with(graph, metadata_for(&["Air", "Moby"]), 10, generator);

        let summary = h.engine.start_from_prompt(&session, "french chill").await.unwrap();

        assert!(summary.cancelled);
        assert!(h.sink.events().is_empty());
        assert!(!session.with_state(|s| s.is_running()));

        let summary = h
            .engine
            .start_from_selection(&session, &strings(&["Radiohead"]))
            .await
            .unwrap();
        assert!(summary.cancelled);
        assert!(h.sink.cards().is_empty());
    }

    #[tokio::test]
    async fn test_failed_resolution_after_stop_is_dropped() {
        let session = Arc::new(session());
        let generator = FakeGenerator::failing(ProviderError::Timeout).on_call({
            let session = session.clone();
            move || {
                session.cancel();
            }
        });
        let h = harness_with(FakeSimilarArtists::new(), metadata_for(&[]), 10, generator);

        let summary = h.engine.start_from_prompt(&session, "anything").await.unwrap();

        assert!(summary.cancelled);
    }

    #[tokio::test]
    async fn test_superseded_run_does_not_report_completion() {
        let h = harness(FakeSimilarArtists::new(), metadata_for(&[]), 10);
        let session = session();
        let old_run = session
            .begin_run(session.prepare_start(), strings(&["Air"]))
            .unwrap();
        let new_run = session
            .begin_run(session.prepare_start(), strings(&["Moby"]))
            .unwrap();

        let summary = h.engine.complete_seed_phase(&session, &old_run, 1);

        assert!(summary.cancelled);
        assert!(h.sink.events().is_empty());
        assert!(session.with_state(|s| s.is_live(new_run.ticket)));
    }
}
