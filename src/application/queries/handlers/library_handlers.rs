//! Library Query Handlers

use std::sync::Arc;

use serde::Serialize;

use crate::application::discovery::{LibrarySync, SeedResolver};
use crate::application::error::ApplicationError;
use crate::application::ports::{SessionManagerPort, UserDirectoryPort};
use crate::application::queries::{GetPersonalSources, ListLibrary};
use crate::domain::discovery::PersonalSource;

// ============================================================================
// Response DTOs
// ============================================================================

/// 曲库列表响应
#[derive(Debug, Clone, Serialize)]
pub struct LibraryResponse {
    pub artists: Vec<String>,
    pub count: usize,
}

/// 单个个人来源的状态
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonalSourceState {
    pub source: PersonalSource,
    pub label: String,
    /// 已配置且当前用户可用
    pub enabled: bool,
    /// 管理员已配置该来源
    pub configured: bool,
    pub username: Option<String>,
    /// 不可用的原因
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// ListLibrary Handler
pub struct ListLibraryHandler {
    library: Arc<LibrarySync>,
}

impl ListLibraryHandler {
    pub fn new(library: Arc<LibrarySync>) -> Self {
        Self { library }
    }

    pub async fn handle(&self, _query: ListLibrary) -> Result<LibraryResponse, ApplicationError> {
        let snapshot = self.library.ensure_loaded().await?;
        Ok(LibraryResponse {
            artists: snapshot.names().to_vec(),
            count: snapshot.len(),
        })
    }
}

/// GetPersonalSources Handler
pub struct PersonalSourcesHandler {
    configured: Vec<PersonalSource>,
    users: Arc<dyn UserDirectoryPort>,
    session_manager: Arc<dyn SessionManagerPort>,
}

impl PersonalSourcesHandler {
    pub fn new(
        resolver: &SeedResolver,
        users: Arc<dyn UserDirectoryPort>,
        session_manager: Arc<dyn SessionManagerPort>,
    ) -> Self {
        let configured: Vec<PersonalSource> = PersonalSource::ALL
            .into_iter()
            .filter(|s| resolver.source_configured(*s))
            .collect();
        Self {
            configured,
            users,
            session_manager,
        }
    }

    pub fn handle(
        &self,
        query: GetPersonalSources,
    ) -> Result<Vec<PersonalSourceState>, ApplicationError> {
        let session = self.session_manager.get(&query.session_id)?;
        let profile = session.identity().user_id.and_then(|id| self.users.find(id));

        let states = PersonalSource::ALL
            .into_iter()
            .map(|source| {
                let configured = self.configured.contains(&source);
                let username = profile
                    .as_ref()
                    .and_then(|p| p.username_for(source))
                    .map(str::to_string);
                let reason = if !configured {
                    Some(format!("{} is not configured", source.label()))
                } else if profile.is_none() {
                    Some("Sign in to use personal recommendations".to_string())
                } else if username.is_none() {
                    Some(format!("Add your {} username to your profile", source.label()))
                } else {
                    None
                };
                PersonalSourceState {
                    source,
                    label: source.label().to_string(),
                    enabled: reason.is_none(),
                    configured,
                    username,
                    reason,
                }
            })
            .collect();

        Ok(states)
    }
}
