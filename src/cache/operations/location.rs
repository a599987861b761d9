use std::sync::Arc;

use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::{LocationCache, keys};
use crate::routes::location::model::UserLocation;
use crate::routes::user::model::User;

/// 基于 Redis 的位置缓存实现
#[derive(Clone)]
pub struct RedisLocationCache {
    redis: Arc<RedisClient>,
}

impl RedisLocationCache {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

impl LocationCache for RedisLocationCache {
    async fn set_location(
        &self,
        location: &UserLocation,
        ttl_secs: u64,
    ) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let key = keys::location_key(&location.user.user_id);
        let json = serde_json::to_string(location).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        let _: () = conn.set_ex(key, json, ttl_secs).await?;

        Ok(())
    }

    async fn locations_for(&self, users: &[User]) -> Result<Vec<UserLocation>, redis::RedisError> {
        // MGET 不接受空键列表
        if users.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let user_keys: Vec<String> = users
            .iter()
            .map(|user| keys::location_key(&user.user_id))
            .collect();
        let cached: Vec<Option<String>> = conn.mget(&user_keys).await?;

        let mut locations = Vec::new();
        for json in cached.into_iter().flatten() {
            match serde_json::from_str::<UserLocation>(&json) {
                Ok(location) => locations.push(location),
                Err(e) => {
                    tracing::warn!("Discarding unparsable cached location: {}", e);
                }
            }
        }

        Ok(locations)
    }
}
