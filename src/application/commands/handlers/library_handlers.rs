//! Library Command Handlers - 刷新曲库、加入艺术家、申请艺术家

use std::sync::Arc;

use crate::application::commands::library_commands::*;
use crate::application::discovery::{DiscoverySession, LibrarySync};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    AddArtistOptions, AddArtistOutcome, AddArtistRequest, ArtistIdentityPort,
    ArtistRequestRecord, ArtistRequestRepositoryPort, DiscoveryEvent, DiscoveryEventSink,
    SessionManagerPort,
};
use crate::domain::discovery::{CardStatus, DiscoveryError};
use crate::domain::name_normalizer::{fuzzy_ratio, is_fuzzy_match};

/// 更新会话中已发出卡片的状态并重新推送
fn patch_card(
    sink: &dyn DiscoveryEventSink,
    session: &DiscoverySession,
    artist_name: &str,
    status: CardStatus,
) {
    if let Some(card) = session.with_state(|state| state.update_status(artist_name, status)) {
        sink.publish(session.id(), DiscoveryEvent::ArtistRefreshed(card));
    }
}

// ============================================================================
// RefreshLibrary
// ============================================================================

/// RefreshLibrary Handler - 刷新快照并向所有会话推送新的勾选列表
pub struct RefreshLibraryHandler {
    library: Arc<LibrarySync>,
    session_manager: Arc<dyn SessionManagerPort>,
    sink: Arc<dyn DiscoveryEventSink>,
}

impl RefreshLibraryHandler {
    pub fn new(
        library: Arc<LibrarySync>,
        session_manager: Arc<dyn SessionManagerPort>,
        sink: Arc<dyn DiscoveryEventSink>,
    ) -> Self {
        Self {
            library,
            session_manager,
            sink,
        }
    }

    pub async fn handle(&self, _cmd: RefreshLibrary) -> Result<RefreshLibraryResponse, ApplicationError> {
        let snapshot = self.library.refresh().await?;

        for id in self.session_manager.list_all() {
            let Ok(session) = self.session_manager.get(&id) else {
                continue;
            };
            let (artists, running) = session.with_state(|state| {
                state.sync_library_items(snapshot.names());
                (state.library_items().to_vec(), state.is_running())
            });
            self.sink
                .publish(&id, DiscoveryEvent::LibraryUpdate { artists, running });
        }

        Ok(RefreshLibraryResponse {
            artist_count: snapshot.len(),
        })
    }
}

// ============================================================================
// AddArtist
// ============================================================================

/// AddArtist Handler - 解析外部 id 后加入曲库
pub struct AddArtistHandler {
    library: Arc<LibrarySync>,
    identity: Arc<dyn ArtistIdentityPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    sink: Arc<dyn DiscoveryEventSink>,
    options: AddArtistOptions,
    fallback_to_top_result: bool,
}

impl AddArtistHandler {
    pub fn new(
        library: Arc<LibrarySync>,
        identity: Arc<dyn ArtistIdentityPort>,
        session_manager: Arc<dyn SessionManagerPort>,
        sink: Arc<dyn DiscoveryEventSink>,
        options: AddArtistOptions,
    ) -> Self {
        Self {
            library,
            identity,
            session_manager,
            sink,
            options,
            fallback_to_top_result: false,
        }
    }

    /// 没有模糊匹配时使用搜索结果第一项
    pub fn with_fallback_to_top_result(mut self, enabled: bool) -> Self {
        self.fallback_to_top_result = enabled;
        self
    }

    pub async fn handle(&self, cmd: AddArtist) -> Result<AddArtistResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        let identity = session.identity();
        if identity.user_id.is_none() {
            return Err(DiscoveryError::NotAuthenticated.into());
        }
        if !identity.is_admin {
            return Err(ApplicationError::forbidden(
                "only administrators can add artists, request them instead",
            ));
        }

        let artist_name = cmd.artist_name.trim().to_string();
        if artist_name.is_empty() {
            return Err(ApplicationError::validation("artist name is empty"));
        }

        let (status, foreign_artist_id) = if self.library.snapshot().contains(&artist_name) {
            (CardStatus::AlreadyPresent, None)
        } else {
            match self.resolve_artist_id(&artist_name).await {
                Some(id) => (self.add(&artist_name, &id).await, Some(id)),
                None => {
                    tracing::warn!(artist = %artist_name, "No matching artist id found");
                    (CardStatus::Failed, None)
                }
            }
        };

        if status == CardStatus::Added {
            self.library.insert_artist(&artist_name);
        }
        patch_card(self.sink.as_ref(), &session, &artist_name, status);

        tracing::info!(artist = %artist_name, status = ?status, "Add artist handled");

        Ok(AddArtistResponse {
            artist_name,
            status,
            foreign_artist_id,
        })
    }

    async fn add(&self, artist_name: &str, foreign_artist_id: &str) -> CardStatus {
        let request = AddArtistRequest {
            name: artist_name.to_string(),
            foreign_artist_id: foreign_artist_id.to_string(),
            options: self.options.clone(),
        };

        match self.library.client().add_artist(request).await {
            Ok(AddArtistOutcome::Added) => CardStatus::Added,
            Ok(AddArtistOutcome::AlreadyPresent) => CardStatus::AlreadyPresent,
            Ok(AddArtistOutcome::InvalidPath) => CardStatus::InvalidPath,
            Ok(AddArtistOutcome::Failed(reason)) => {
                tracing::warn!(artist = %artist_name, reason = %reason, "Library manager rejected artist");
                CardStatus::Failed
            }
            Err(e) => {
                tracing::error!(artist = %artist_name, error = %e, "Failed to add artist");
                CardStatus::Failed
            }
        }
    }

    /// 最佳模糊匹配的 id
    async fn resolve_artist_id(&self, artist_name: &str) -> Option<String> {
        let entries = match self.identity.lookup(artist_name).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(artist = %artist_name, error = %e, "Artist id lookup failed");
                return None;
            }
        };

        let best = entries
            .iter()
            .filter(|entry| is_fuzzy_match(&entry.name, artist_name))
            .max_by(|a, b| {
                fuzzy_ratio(&a.name, artist_name).total_cmp(&fuzzy_ratio(&b.name, artist_name))
            });

        match best {
            Some(entry) => Some(entry.id.clone()),
            None if self.fallback_to_top_result => entries.first().map(|e| e.id.clone()),
            None => None,
        }
    }
}

// ============================================================================
// RequestArtist
// ============================================================================

/// RequestArtist Handler - 记录待处理申请
pub struct RequestArtistHandler {
    repo: Arc<dyn ArtistRequestRepositoryPort>,
    session_manager: Arc<dyn SessionManagerPort>,
    sink: Arc<dyn DiscoveryEventSink>,
}

impl RequestArtistHandler {
    pub fn new(
        repo: Arc<dyn ArtistRequestRepositoryPort>,
        session_manager: Arc<dyn SessionManagerPort>,
        sink: Arc<dyn DiscoveryEventSink>,
    ) -> Self {
        Self {
            repo,
            session_manager,
            sink,
        }
    }

    pub async fn handle(&self, cmd: RequestArtist) -> Result<RequestArtistResponse, ApplicationError> {
        let session = self.session_manager.get(&cmd.session_id)?;
        let user_id = session
            .identity()
            .user_id
            .ok_or(DiscoveryError::NotAuthenticated)?;

        let artist_name = cmd.artist_name.trim().to_string();
        if artist_name.is_empty() {
            return Err(ApplicationError::validation("artist name is empty"));
        }

        let created = match self.repo.find_pending(user_id, &artist_name).await? {
            Some(_) => {
                self.sink.publish(
                    session.id(),
                    DiscoveryEvent::notice(
                        "Already Requested",
                        format!("You already have a pending request for {}.", artist_name),
                    ),
                );
                false
            }
            None => {
                self.repo
                    .save(&ArtistRequestRecord::pending(&artist_name, user_id))
                    .await?;
                tracing::info!(artist = %artist_name, user_id = user_id, "Artist requested");
                true
            }
        };

        patch_card(self.sink.as_ref(), &session, &artist_name, CardStatus::Requested);

        Ok(RequestArtistResponse {
            artist_name,
            created,
        })
    }
}
