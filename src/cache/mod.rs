// 缓存模块
// 外部位置缓存与广播通道的访问约定，以及两者的 Redis 实现

use std::future::Future;

use futures_util::stream::BoxStream;

pub mod keys;
pub mod operations;

pub use operations::location::RedisLocationCache;
pub use operations::pubsub::RedisLocationBus;

use crate::routes::location::model::UserLocation;
use crate::routes::user::model::User;

/// 按用户维度保存最近一次位置的外部缓存。
/// 条目带过期时间，过期后视同不存在；写入覆盖旧值，不保留历史。
pub trait LocationCache: Clone + Send + Sync + 'static {
    /// 写入并覆盖该用户的最近位置
    fn set_location(
        &self,
        location: &UserLocation,
        ttl_secs: u64,
    ) -> impl Future<Output = Result<(), redis::RedisError>> + Send;

    /// 批量读取一组用户的最近位置。
    /// 缓存中不存在（从未写入或已过期）的用户直接跳过，
    /// 绝不能让缺失的条目凭空参与距离计算。
    fn locations_for(
        &self,
        users: &[User],
    ) -> impl Future<Output = Result<Vec<UserLocation>, redis::RedisError>> + Send;
}

/// 以用户为频道粒度的位置广播
pub trait LocationBus: Clone + Send + Sync + 'static {
    /// 把位置更新广播给该用户频道的所有在线订阅者，尽力送达，
    /// 没有订阅者时消息直接丢弃
    fn publish(
        &self,
        location: &UserLocation,
    ) -> impl Future<Output = Result<(), redis::RedisError>> + Send;

    /// 订阅某个用户的位置更新流。
    /// 返回时订阅已在服务端生效，调用方不会漏掉返回之后发布的更新。
    fn subscribe(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<BoxStream<'static, UserLocation>, redis::RedisError>> + Send;
}
