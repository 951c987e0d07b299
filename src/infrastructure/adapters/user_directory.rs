//! Config User Directory - 来自配置文件的用户目录

use std::collections::HashMap;

use crate::application::ports::{UserDirectoryPort, UserProfile};
use crate::config::UserConfig;

/// 配置用户目录（只读）
pub struct ConfigUserDirectory {
    users: HashMap<i64, UserProfile>,
}

impl ConfigUserDirectory {
    pub fn new(users: &[UserConfig]) -> Self {
        let mut map = HashMap::with_capacity(users.len());
        for user in users {
            if map.insert(user.id, UserProfile::from(user)).is_some() {
                tracing::warn!(user_id = user.id, "Duplicate user id in config, last entry wins");
            }
        }
        Self { users: map }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserDirectoryPort for ConfigUserDirectory {
    fn find(&self, user_id: i64) -> Option<UserProfile> {
        self.users.get(&user_id).cloned()
    }
}
