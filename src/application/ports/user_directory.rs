//! User Directory Port - 用户身份目录

use crate::domain::discovery::PersonalSource;

/// 用户资料
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    pub lastfm_username: Option<String>,
    pub listenbrainz_username: Option<String>,
}

impl UserProfile {
    /// 个人来源对应的用户名（空白视为未配置）
    pub fn username_for(&self, source: PersonalSource) -> Option<&str> {
        let name = match source {
            PersonalSource::LastFm => self.lastfm_username.as_deref(),
            PersonalSource::ListenBrainz => self.listenbrainz_username.as_deref(),
        };
        name.map(str::trim).filter(|n| !n.is_empty())
    }
}

pub trait UserDirectoryPort: Send + Sync {
    fn find(&self, user_id: i64) -> Option<UserProfile>;
}
