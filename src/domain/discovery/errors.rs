//! Discovery Context - Errors

use serde::Serialize;
use thiserror::Error;

use super::PersonalSource;

/// 错误大类（客户端可据此区分处理）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// 输入错误（未选择种子、空查询等）
    InputError,
    /// 协作方未配置
    CollaboratorUnavailable,
    /// 协作方调用失败（网络、超时、异常响应）
    CollaboratorFailure,
    /// 没有任何可用结果
    NoUsableResult,
    /// 需要身份但缺失
    NotAuthorized,
}

/// 推荐会话的运行级错误
///
/// 单元级失败（单个种子、单张卡片）不会出现在这里，它们被降级为警告
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DiscoveryError {
    #[error("no library artists selected")]
    NoSeedsSelected,

    #[error("empty {0}")]
    EmptyInput(&'static str),

    #[error("unknown discovery source: {0}")]
    UnknownSource(String),

    #[error("seed generator is not configured")]
    GeneratorUnavailable,

    #[error("seed generator timed out")]
    GeneratorTimeout,

    #[error("seed generator failed: {0}")]
    GeneratorError(String),

    #[error("keyword search failed: {0}")]
    SearchFailed(String),

    #[error("{source_label} returned no artists")]
    EmptyResult { source_label: String },

    #[error("all seeds are already in the library")]
    AllSeedsKnown,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{0} is not configured")]
    SourceNotConfigured(PersonalSource),

    #[error("no {0} username configured")]
    UsernameMissing(PersonalSource),

    #[error("{provider} unavailable: {message}")]
    SourceUnavailable {
        provider: PersonalSource,
        message: String,
    },

    #[error("library manager unavailable: {0}")]
    LibraryUnavailable(String),

    #[error("no artist could be resolved")]
    NoArtistsResolved,
}

impl DiscoveryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiscoveryError::NoSeedsSelected
            | DiscoveryError::EmptyInput(_)
            | DiscoveryError::UnknownSource(_) => ErrorKind::InputError,
            DiscoveryError::GeneratorUnavailable | DiscoveryError::SourceNotConfigured(_) => {
                ErrorKind::CollaboratorUnavailable
            }
            DiscoveryError::GeneratorTimeout
            | DiscoveryError::GeneratorError(_)
            | DiscoveryError::SearchFailed(_)
            | DiscoveryError::SourceUnavailable { .. }
            | DiscoveryError::LibraryUnavailable(_) => ErrorKind::CollaboratorFailure,
            DiscoveryError::EmptyResult { .. }
            | DiscoveryError::AllSeedsKnown
            | DiscoveryError::NoArtistsResolved => ErrorKind::NoUsableResult,
            DiscoveryError::NotAuthenticated | DiscoveryError::UsernameMissing(_) => {
                ErrorKind::NotAuthorized
            }
        }
    }

    /// 面向用户的简短提示
    pub fn user_message(&self) -> String {
        match self {
            DiscoveryError::NoSeedsSelected => {
                "Choose at least one library artist to start.".to_string()
            }
            DiscoveryError::EmptyInput(what) => match *what {
                "prompt" => "Describe what kind of music you're after so the AI assistant can help."
                    .to_string(),
                _ => "No query provided.".to_string(),
            },
            DiscoveryError::UnknownSource(_) => "Unknown discovery source requested.".to_string(),
            DiscoveryError::GeneratorUnavailable => {
                "AI assistant isn't configured yet. Add an LLM API key or base URL in settings."
                    .to_string()
            }
            DiscoveryError::GeneratorTimeout => {
                "The AI request timed out. Please try again or adjust the prompt.".to_string()
            }
            DiscoveryError::GeneratorError(_) => {
                "We couldn't reach the AI assistant. Please try again in a moment.".to_string()
            }
            DiscoveryError::SearchFailed(_) => {
                "We couldn't reach MusicBrainz right now. Please try again shortly.".to_string()
            }
            DiscoveryError::EmptyResult { source_label } => format!(
                "{} couldn't suggest any artists from that request. Try adding genre or artist hints.",
                source_label
            ),
            DiscoveryError::AllSeedsKnown => {
                "All suggested artists are already in your library. Try a different request."
                    .to_string()
            }
            DiscoveryError::NotAuthenticated => {
                "You need to sign in again before requesting personal recommendations.".to_string()
            }
            DiscoveryError::SourceNotConfigured(source) => format!(
                "Administrator must configure {} before this feature can be used.",
                source.label()
            ),
            DiscoveryError::UsernameMissing(source) => format!(
                "Add your {} username under Profile → Listening services to use this feature.",
                source.label()
            ),
            DiscoveryError::SourceUnavailable { provider, .. } => format!(
                "We couldn't reach {} right now. Please try again shortly.",
                provider.label()
            ),
            DiscoveryError::LibraryUnavailable(_) => {
                "The library manager could not be reached.".to_string()
            }
            DiscoveryError::NoArtistsResolved => {
                "We couldn't load those artists from our data sources. Try refining your request."
                    .to_string()
            }
        }
    }
}
