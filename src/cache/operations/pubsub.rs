use std::sync::Arc;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::{LocationBus, keys};
use crate::routes::location::model::UserLocation;

/// 基于 Redis 发布/订阅的位置广播实现。
/// 每个订阅持有一条独立的 pubsub 连接，连接断开即退订。
#[derive(Clone)]
pub struct RedisLocationBus {
    redis: Arc<RedisClient>,
}

impl RedisLocationBus {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

impl LocationBus for RedisLocationBus {
    async fn publish(&self, location: &UserLocation) -> Result<(), redis::RedisError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let channel = keys::location_channel(&location.user.user_id);
        let json = serde_json::to_string(location).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::IoError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        // 返回值是收到消息的订阅者数量，这里不关心
        let _: i64 = conn.publish(channel, json).await?;

        Ok(())
    }

    async fn subscribe(
        &self,
        user_id: &str,
    ) -> Result<BoxStream<'static, UserLocation>, redis::RedisError> {
        let mut pubsub = self.redis.get_async_pubsub().await?;
        // subscribe 返回即表示服务端已确认订阅，
        // 确认之后发布的更新不会被漏掉
        pubsub.subscribe(keys::location_channel(user_id)).await?;

        let updates = pubsub
            .into_on_message()
            .filter_map(|msg| async move {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("Failed to read pubsub payload: {}", e);
                        return None;
                    }
                };
                match serde_json::from_str::<UserLocation>(&payload) {
                    Ok(location) => Some(location),
                    Err(e) => {
                        tracing::warn!("Discarding unparsable pubsub payload: {}", e);
                        None
                    }
                }
            })
            .boxed();

        Ok(updates)
    }
}
