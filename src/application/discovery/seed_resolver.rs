//! 种子解析
//!
//! 四种来源（曲库选择、自由文本、关键字搜索、个人历史）统一输出：
//! 有序、按规范化名称去重、已排除曲库成员的种子列表，或一个类型化错误。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;

use super::fallback::{Attempt, FallbackChain};
use crate::application::ports::{
    KeywordSearchPort, PersonalHistoryPort, ProviderError, SeedGeneratorPort, UserDirectoryPort,
};
use crate::domain::discovery::{
    DiscoveryError, LibrarySnapshot, PersonalSource, SeedOrigin, SessionIdentity,
};
use crate::domain::name_normalizer::{dedupe_names, normalize};

/// 解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSeeds {
    pub origin: SeedOrigin,
    pub seeds: Vec<String>,
    /// 已在曲库中而被跳过的名称（提示，不是错误）
    pub skipped: Vec<String>,
}

pub struct SeedResolver {
    generator: Option<Arc<dyn SeedGeneratorPort>>,
    search: Arc<dyn KeywordSearchPort>,
    users: Arc<dyn UserDirectoryPort>,
    personal: HashMap<PersonalSource, Vec<Arc<dyn PersonalHistoryPort>>>,
}

impl SeedResolver {
    pub fn new(search: Arc<dyn KeywordSearchPort>, users: Arc<dyn UserDirectoryPort>) -> Self {
        Self {
            generator: None,
            search,
            users,
            personal: HashMap::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn SeedGeneratorPort>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// 注册个人来源的策略（按顺序回退）
    pub fn with_personal_source(
        mut self,
        source: PersonalSource,
        strategies: Vec<Arc<dyn PersonalHistoryPort>>,
    ) -> Self {
        if !strategies.is_empty() {
            self.personal.insert(source, strategies);
        }
        self
    }

    pub fn generator_configured(&self) -> bool {
        self.generator.is_some()
    }

    pub fn source_configured(&self, source: PersonalSource) -> bool {
        self.personal.contains_key(&source)
    }

    /// 曲库选择：与曲库列表取交集，按列表顺序输出
    pub fn from_selection(
        &self,
        selection: &[String],
        listing: &[String],
    ) -> Result<Vec<String>, DiscoveryError> {
        let wanted: HashSet<String> = selection.iter().map(|n| normalize(n)).collect();
        let seeds = dedupe_names(listing.iter().filter(|name| wanted.contains(&normalize(name))));

        if seeds.is_empty() {
            return Err(DiscoveryError::NoSeedsSelected);
        }
        Ok(seeds)
    }

    /// 自由文本
    pub async fn from_prompt(
        &self,
        prompt: &str,
        library: &LibrarySnapshot,
    ) -> Result<ResolvedSeeds, DiscoveryError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DiscoveryError::EmptyInput("prompt"));
        }
        let generator = self
            .generator
            .as_ref()
            .ok_or(DiscoveryError::GeneratorUnavailable)?;

        let names = generator
            .generate(prompt, library.names())
            .await
            .map_err(|e| match e {
                ProviderError::Timeout => DiscoveryError::GeneratorTimeout,
                ProviderError::NotConfigured(_) => DiscoveryError::GeneratorUnavailable,
                other => DiscoveryError::GeneratorError(other.to_string()),
            })?;

        tracing::info!(model = %generator.model(), returned = names.len(), "Seed generator answered");
        filter_known(SeedOrigin::Prompt, names, library)
    }

    /// 关键字搜索
    pub async fn from_search(
        &self,
        query: &str,
        library: &LibrarySnapshot,
    ) -> Result<ResolvedSeeds, DiscoveryError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DiscoveryError::EmptyInput("query"));
        }

        let names = self
            .search
            .search(query)
            .await
            .map_err(|e| DiscoveryError::SearchFailed(e.to_string()))?;

        filter_known(SeedOrigin::Search, names, library)
    }

    /// 个人历史
    pub async fn from_personal(
        &self,
        source_key: &str,
        identity: SessionIdentity,
        library: &LibrarySnapshot,
    ) -> Result<ResolvedSeeds, DiscoveryError> {
        let source = PersonalSource::from_key(source_key)
            .ok_or_else(|| DiscoveryError::UnknownSource(source_key.to_string()))?;

        let profile = identity
            .user_id
            .and_then(|id| self.users.find(id))
            .ok_or(DiscoveryError::NotAuthenticated)?;

        let strategies = self
            .personal
            .get(&source)
            .ok_or(DiscoveryError::SourceNotConfigured(source))?;

        let username = profile
            .username_for(source)
            .ok_or(DiscoveryError::UsernameMissing(source))?
            .to_string();

        let chain = strategies
            .iter()
            .fold(FallbackChain::new(), |chain, strategy| {
                chain.then(HistoryAttempt {
                    strategy: strategy.clone(),
                    username: username.clone(),
                })
            });

        let names = chain
            .first_present()
            .await
            .map_err(|e| DiscoveryError::SourceUnavailable {
                provider: source,
                message: e.to_string(),
            })?
            .unwrap_or_default();

        filter_known(SeedOrigin::Personal { source, username }, names, library)
    }
}

/// 去重后排除曲库成员
fn filter_known(
    origin: SeedOrigin,
    names: Vec<String>,
    library: &LibrarySnapshot,
) -> Result<ResolvedSeeds, DiscoveryError> {
    let names = dedupe_names(names);
    if names.is_empty() {
        return Err(DiscoveryError::EmptyResult {
            source_label: origin.label().to_string(),
        });
    }

    let (skipped, seeds): (Vec<String>, Vec<String>) =
        names.into_iter().partition(|name| library.contains(name));

    if seeds.is_empty() {
        return Err(DiscoveryError::AllSeedsKnown);
    }

    Ok(ResolvedSeeds {
        origin,
        seeds,
        skipped,
    })
}

struct HistoryAttempt {
    strategy: Arc<dyn PersonalHistoryPort>,
    username: String,
}

#[async_trait]
impl Attempt<Vec<String>> for HistoryAttempt {
    fn label(&self) -> String {
        self.strategy.label().to_string()
    }

    async fn run(&self) -> Result<Option<Vec<String>>, ProviderError> {
        let names = self.strategy.recommendations_for(&self.username).await?;
        Ok(Some(names).filter(|n| !n.is_empty()))
    }
}
