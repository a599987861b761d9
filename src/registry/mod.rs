use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::routes::location::model::UserLocation;

/// 进程内共享的用户最近位置表。
///
/// 好友的异步更新到达时，用它回查本地用户自己最近一次上报的位置；
/// 跨进程的权威数据始终在外部缓存里，这张表只对本进程内的会话负责，
/// 条目随进程存续，不做淘汰。
#[derive(Clone, Default)]
pub struct LocationRegistry {
    inner: Arc<RwLock<HashMap<String, UserLocation>>>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖写入，最后写入者获胜
    pub fn set(&self, location: UserLocation) {
        let mut map = self.inner.write().expect("location registry lock poisoned");
        map.insert(location.user.user_id.clone(), location);
    }

    /// 该用户在本进程上从未上报过时返回 None
    pub fn get(&self, user_id: &str) -> Option<UserLocation> {
        let map = self.inner.read().expect("location registry lock poisoned");
        map.get(user_id).cloned()
    }
}
