/// 用户位置缓存键前缀
const LOCATION_PREFIX: &str = "user:location:";

/// 用户位置广播频道前缀
const LOCATION_CHANNEL_PREFIX: &str = "user:location:updates:";

/// 生成用户位置缓存键
pub fn location_key(user_id: &str) -> String {
    format!("{}{}", LOCATION_PREFIX, user_id)
}

/// 生成用户位置广播频道名
pub fn location_channel(user_id: &str) -> String {
    format!("{}{}", LOCATION_CHANNEL_PREFIX, user_id)
}
