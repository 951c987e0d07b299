//! 测试替身：所有端口的内存实现

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::application::discovery::DiscoverySession;
use crate::application::ports::*;
use crate::domain::discovery::{LibraryItem, LibrarySnapshot, SessionIdentity};
use crate::domain::name_normalizer::normalize;

type Hook = Box<dyn Fn() + Send + Sync>;

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

// ============================================================================
// Similar artists
// ============================================================================

#[derive(Default)]
pub struct FakeSimilarArtists {
    graph: HashMap<String, Result<Vec<SimilarArtist>, ProviderError>>,
    cancel_on: Option<(String, CancellationToken)>,
    calls: Mutex<Vec<String>>,
}

impl FakeSimilarArtists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, seed: &str, neighbors: Vec<SimilarArtist>) -> Self {
        self.graph.insert(seed.to_string(), Ok(neighbors));
        self
    }

    pub fn failing(mut self, seed: &str, error: ProviderError) -> Self {
        self.graph.insert(seed.to_string(), Err(error));
        self
    }

    /// 查询到 `seed` 时触发取消（模拟查询进行中收到停止请求）
    pub fn cancel_on_call(mut self, seed: &str, token: CancellationToken) -> Self {
        self.cancel_on = Some((seed.to_string(), token));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SimilarArtistProviderPort for FakeSimilarArtists {
    async fn neighbors(&self, name: &str) -> Result<Vec<SimilarArtist>, ProviderError> {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some((seed, token)) = &self.cancel_on {
            if seed == name {
                token.cancel();
            }
        }
        self.graph.get(name).cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ============================================================================
// Metadata / artwork
// ============================================================================

#[derive(Default)]
pub struct FakeMetadata {
    known: HashMap<String, ArtistMetadata>,
    search: HashMap<String, Vec<String>>,
    biographies: HashMap<String, String>,
    top_tracks: HashMap<String, Vec<String>>,
    hooks: Mutex<HashMap<String, Hook>>,
    calls: Mutex<Vec<String>>,
}

impl FakeMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, metadata: ArtistMetadata) -> Self {
        self.known.insert(normalize(name), metadata);
        self
    }

    pub fn with_search(mut self, query: &str, results: &[&str]) -> Self {
        self.search.insert(normalize(query), strings(results));
        self
    }

    pub fn with_biography(mut self, name: &str, biography: &str) -> Self {
        self.biographies.insert(name.to_string(), biography.to_string());
        self
    }

    pub fn with_top_tracks(mut self, name: &str, tracks: &[&str]) -> Self {
        self.top_tracks.insert(normalize(name), strings(tracks));
        self
    }

    /// `describe(name)` 被调用时执行回调
    pub fn on_call(&self, name: &str, hook: impl Fn() + Send + Sync + 'static) {
        self.hooks
            .lock()
            .unwrap()
            .insert(name.to_string(), Box::new(hook));
    }

    pub fn cancel_on_call(&self, name: &str, token: CancellationToken) {
        self.on_call(name, move || token.cancel());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataProviderPort for FakeMetadata {
    async fn describe(&self, name: &str) -> Result<ArtistMetadata, ProviderError> {
        self.calls.lock().unwrap().push(name.to_string());
        if let Some(hook) = self.hooks.lock().unwrap().get(name) {
            hook();
        }
        self.known
            .get(&normalize(name))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))
    }

    async fn search_artists(&self, name: &str) -> Result<Vec<String>, ProviderError> {
        Ok(self.search.get(&normalize(name)).cloned().unwrap_or_default())
    }

    async fn biography(&self, name: &str) -> Result<ArtistBiography, ProviderError> {
        Ok(ArtistBiography {
            name: name.to_string(),
            biography: self.biographies.get(name).cloned(),
        })
    }

    async fn top_tracks(&self, name: &str, limit: usize) -> Result<Vec<String>, ProviderError> {
        let mut tracks = self.top_tracks.get(&normalize(name)).cloned().unwrap_or_default();
        tracks.truncate(limit);
        Ok(tracks)
    }
}

pub struct FakeArtwork {
    result: Result<HashMap<String, String>, ProviderError>,
}

impl FakeArtwork {
    pub fn with(name: &str, url: &str) -> Self {
        Self {
            result: Ok(HashMap::from([(name.to_string(), url.to_string())])),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ArtworkProviderPort for FakeArtwork {
    async fn image_url(&self, name: &str) -> Result<Option<String>, ProviderError> {
        match &self.result {
            Ok(urls) => Ok(urls.get(name).cloned()),
            Err(e) => Err(e.clone()),
        }
    }
}

// ============================================================================
// Seed sources
// ============================================================================

pub struct FakeGenerator {
    result: Result<Vec<String>, ProviderError>,
    hook: Option<Hook>,
}

impl FakeGenerator {
    pub fn returning(names: &[&str]) -> Self {
        Self {
            result: Ok(strings(names)),
            hook: None,
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            result: Err(error),
            hook: None,
        }
    }

    /// 生成前执行的回调（模拟慢调用期间发生的事）
    pub fn on_call(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }
}

#[async_trait]
impl SeedGeneratorPort for FakeGenerator {
    async fn generate(&self, _prompt: &str, _library: &[String]) -> Result<Vec<String>, ProviderError> {
        if let Some(hook) = &self.hook {
            hook();
        }
        self.result.clone()
    }
}

pub struct FakeSearch {
    result: Result<Vec<String>, ProviderError>,
}

impl FakeSearch {
    pub fn returning(names: &[&str]) -> Self {
        Self {
            result: Ok(strings(names)),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl KeywordSearchPort for FakeSearch {
    async fn search(&self, _query: &str) -> Result<Vec<String>, ProviderError> {
        self.result.clone()
    }
}

pub struct FakeHistory {
    label: String,
    result: Result<Vec<String>, ProviderError>,
}

impl FakeHistory {
    pub fn returning(label: &str, names: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            result: Ok(strings(names)),
        }
    }

    pub fn failing(label: &str, error: ProviderError) -> Self {
        Self {
            label: label.to_string(),
            result: Err(error),
        }
    }
}

#[async_trait]
impl PersonalHistoryPort for FakeHistory {
    fn label(&self) -> &str {
        &self.label
    }

    async fn recommendations_for(&self, _username: &str) -> Result<Vec<String>, ProviderError> {
        self.result.clone()
    }
}

pub struct FakeArtistIdentity {
    result: Result<Vec<CatalogArtist>, ProviderError>,
}

impl FakeArtistIdentity {
    pub fn returning(entries: &[(&str, &str)]) -> Self {
        Self {
            result: Ok(entries
                .iter()
                .map(|(id, name)| CatalogArtist {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self { result: Err(error) }
    }
}

#[async_trait]
impl ArtistIdentityPort for FakeArtistIdentity {
    async fn lookup(&self, _name: &str) -> Result<Vec<CatalogArtist>, ProviderError> {
        self.result.clone()
    }
}

// ============================================================================
// Library
// ============================================================================

pub struct FakeLibraryClient {
    artists: Result<Vec<String>, ProviderError>,
    outcome: Result<AddArtistOutcome, ProviderError>,
    list_calls: Mutex<usize>,
    added: Mutex<Vec<AddArtistRequest>>,
}

impl FakeLibraryClient {
    pub fn with_artists(names: &[&str]) -> Self {
        Self {
            artists: Ok(strings(names)),
            outcome: Ok(AddArtistOutcome::Added),
            list_calls: Mutex::new(0),
            added: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            artists: Err(error.clone()),
            outcome: Err(error),
            ..Self::with_artists(&[])
        }
    }

    pub fn with_outcome(mut self, outcome: AddArtistOutcome) -> Self {
        self.outcome = Ok(outcome);
        self
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    pub fn added(&self) -> Vec<AddArtistRequest> {
        self.added.lock().unwrap().clone()
    }
}

#[async_trait]
impl LibraryClientPort for FakeLibraryClient {
    async fn list_artists(&self) -> Result<Vec<String>, ProviderError> {
        *self.list_calls.lock().unwrap() += 1;
        self.artists.clone()
    }

    async fn add_artist(&self, request: AddArtistRequest) -> Result<AddArtistOutcome, ProviderError> {
        self.added.lock().unwrap().push(request);
        self.outcome.clone()
    }
}

#[derive(Default)]
pub struct FakeLibraryCache {
    snapshot: RwLock<Arc<LibrarySnapshot>>,
}

impl FakeLibraryCache {
    pub fn with(names: &[&str]) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(LibrarySnapshot::new(strings(names)))),
        }
    }
}

impl LibraryCachePort for FakeLibraryCache {
    fn snapshot(&self) -> Arc<LibrarySnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    fn replace(&self, snapshot: LibrarySnapshot) {
        *self.snapshot.write().unwrap() = Arc::new(snapshot);
    }

    fn insert_artist(&self, name: &str) {
        let mut guard = self.snapshot.write().unwrap();
        *guard = Arc::new(guard.with_artist(name));
    }
}

// ============================================================================
// Previews
// ============================================================================

pub struct FakePreview {
    name: String,
    artist_only: bool,
    /// key: 曲目名（按艺术家查询时为空字符串）
    previews: HashMap<String, AudioPreview>,
    error: Option<ProviderError>,
    calls: Mutex<Vec<Option<String>>>,
}

impl FakePreview {
    pub fn new(name: &str, artist_only: bool) -> Self {
        Self {
            name: name.to_string(),
            artist_only,
            previews: HashMap::new(),
            error: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_track(mut self, artist: &str, track: &str) -> Self {
        self.previews.insert(
            track.to_string(),
            AudioPreview {
                source: self.name.clone(),
                artist: artist.to_string(),
                track: track.to_string(),
                preview_url: Some(format!("https://preview/{}/{}", self.name, track)),
                video_id: None,
            },
        );
        self
    }

    pub fn with_artist_preview(mut self, artist: &str, track: &str) -> Self {
        self = self.with_track(artist, track);
        if let Some(preview) = self.previews.remove(track) {
            self.previews.insert(String::new(), preview);
        }
        self
    }

    pub fn failing(mut self, error: ProviderError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PreviewProviderPort for FakePreview {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_artist_only(&self) -> bool {
        self.artist_only
    }

    async fn find_preview(
        &self,
        _artist: &str,
        track: Option<&str>,
    ) -> Result<Option<AudioPreview>, ProviderError> {
        self.calls.lock().unwrap().push(track.map(str::to_string));
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        Ok(self.previews.get(track.unwrap_or_default()).cloned())
    }
}

// ============================================================================
// Users / requests / sessions
// ============================================================================

#[derive(Default)]
pub struct FakeUserDirectory {
    users: HashMap<i64, UserProfile>,
}

impl FakeUserDirectory {
    pub fn with(users: Vec<UserProfile>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
        }
    }
}

impl UserDirectoryPort for FakeUserDirectory {
    fn find(&self, user_id: i64) -> Option<UserProfile> {
        self.users.get(&user_id).cloned()
    }
}

#[derive(Default)]
pub struct FakeRequestRepository {
    records: Mutex<Vec<ArtistRequestRecord>>,
}

impl FakeRequestRepository {
    pub fn records(&self) -> Vec<ArtistRequestRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtistRequestRepositoryPort for FakeRequestRepository {
    async fn save(&self, record: &ArtistRequestRecord) -> Result<(), RepositoryError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn find_pending(
        &self,
        requested_by: i64,
        artist_name: &str,
    ) -> Result<Option<ArtistRequestRecord>, RepositoryError> {
        let key = normalize(artist_name);
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| {
                r.requested_by == requested_by
                    && r.status == RequestStatus::Pending
                    && normalize(&r.artist_name) == key
            })
            .cloned())
    }

    async fn find_by_user(&self, requested_by: i64) -> Result<Vec<ArtistRequestRecord>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.requested_by == requested_by)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeSessionManager {
    sessions: Mutex<HashMap<String, Arc<DiscoverySession>>>,
}

impl SessionManagerPort for FakeSessionManager {
    fn open(&self, id: &str, identity: SessionIdentity) -> Arc<DiscoverySession> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(DiscoverySession::new(id, identity)));
        session.set_identity(identity);
        session.clone()
    }

    fn get(&self, id: &str) -> Result<Arc<DiscoverySession>, SessionError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn close(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .lock()
            .unwrap()
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        session.close();
        Ok(())
    }

    fn touch(&self, _id: &str) {}

    fn list_all(&self) -> Vec<String> {
        self.sessions.lock().unwrap().keys().cloned().collect()
    }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, DiscoveryEvent)>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<DiscoveryEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn contains(&self, event: &DiscoveryEvent) -> bool {
        self.events().iter().any(|e| e == event)
    }

    /// 已推送卡片的名称（按推送顺序）
    pub fn cards(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DiscoveryEvent::ArtistLoaded(card) => Some(card.name),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DiscoveryEvent::Notice { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn last_library_update(&self) -> Option<(Vec<LibraryItem>, bool)> {
        self.events().into_iter().rev().find_map(|e| match e {
            DiscoveryEvent::LibraryUpdate { artists, running } => Some((artists, running)),
            _ => None,
        })
    }
}

impl DiscoveryEventSink for RecordingSink {
    fn publish(&self, session_id: &str, event: DiscoveryEvent) {
        self.events
            .lock()
            .unwrap()
            .push((session_id.to_string(), event));
    }
}
