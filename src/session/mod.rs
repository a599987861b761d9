//! 实时邻近会话
//!
//! 每条连接对应一个会话，生命周期为
//! `AwaitingFirstReport -> Active -> Closed`：
//! 第一条消息确立身份和初始位置，并触发一次全量好友距离扫描；
//! 之后持续接收位置上报，同时响应好友频道上的异步更新；
//! 连接关闭时回收全部订阅。

use std::fmt::Display;
use std::future::Future;

use axum::extract::ws::Message;
use chrono::Utc;
use futures_util::stream::BoxStream;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cache::{LocationBus, LocationCache};
use crate::geo;
use crate::registry::LocationRegistry;
use crate::routes::location::model::{StreamError, UserDistance, UserLocation};
use crate::routes::user::model::User;
use crate::utils::error_codes;

/// 好友名单解析，由关系存储提供
pub trait FriendDirectory: Clone + Send + Sync + 'static {
    fn friends_of(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<User>, sqlx::Error>> + Send;
}

impl FriendDirectory for PgPool {
    async fn friends_of(&self, user_id: &str) -> Result<Vec<User>, sqlx::Error> {
        User::friends(self, user_id).await
    }
}

/// 好友更新汇入会话的队列容量，写满时订阅转发任务等待
const UPDATE_QUEUE_CAPACITY: usize = 64;

pub struct ProximitySession<C, B, F> {
    cache: C,
    bus: B,
    friends: F,
    registry: LocationRegistry,
    nearby_threshold_miles: f64,
    location_ttl_secs: u64,
}

impl<C, B, F> ProximitySession<C, B, F>
where
    C: LocationCache,
    B: LocationBus,
    F: FriendDirectory,
{
    pub fn new(
        cache: C,
        bus: B,
        friends: F,
        registry: LocationRegistry,
        nearby_threshold_miles: f64,
        location_ttl_secs: u64,
    ) -> Self {
        Self {
            cache,
            bus,
            friends,
            registry,
            nearby_threshold_miles,
            location_ttl_secs,
        }
    }

    /// 驱动一条连接直到关闭。
    ///
    /// 对外的所有写入都发生在本任务里：初始扫描直接写，
    /// 好友更新经由一条有界队列汇入后再写，
    /// 同一连接上永远不会出现并发写。
    pub async fn run<T, E>(self, transport: T)
    where
        T: Stream<Item = Result<Message, E>> + Sink<Message, Error = E>,
        E: Display,
    {
        let (mut outbound, mut inbound) = transport.split();

        // AwaitingFirstReport：第一条文本消息必须是合法的位置上报
        let first = loop {
            match inbound.next().await {
                Some(Ok(Message::Text(text))) => break text,
                Some(Ok(Message::Close(_))) | None => return,
                // 非文本帧在握手阶段一律忽略
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!("Connection failed before first report: {}", e);
                    return;
                }
            }
        };

        let location = match serde_json::from_str::<UserLocation>(first.as_str()) {
            Ok(location) => location,
            Err(e) => {
                let error = StreamError {
                    code: error_codes::VALIDATION_ERROR,
                    message: format!("非法的位置上报: {}", e),
                };
                let _ = deliver(&mut outbound, &error).await;
                return;
            }
        };
        let user = location.user.clone();

        // 握手路径上缓存写入失败是致命的
        if let Err(e) = self
            .cache
            .set_location(&location, self.location_ttl_secs)
            .await
        {
            let error = StreamError {
                code: error_codes::INTERNAL_ERROR,
                message: format!("缓存用户 {} 的位置失败: {}", user.user_id, e),
            };
            let _ = deliver(&mut outbound, &error).await;
            return;
        }
        self.registry.set(location.clone());

        // 好友名单在会话建立时解析一次，
        // 会话中途建立的好友关系对本会话不可见
        let friends = match self.friends.friends_of(&user.user_id).await {
            Ok(friends) => friends,
            Err(e) => {
                let error = StreamError {
                    code: error_codes::INTERNAL_ERROR,
                    message: format!("解析用户 {} 的好友失败: {}", user.user_id, e),
                };
                let _ = deliver(&mut outbound, &error).await;
                return;
            }
        };

        // 初始扫描：批量读出好友的缓存位置，
        // 给阈值内的每个好友推送一份距离报告
        let cached = match self.cache.locations_for(&friends).await {
            Ok(cached) => cached,
            Err(e) => {
                let error = StreamError {
                    code: error_codes::INTERNAL_ERROR,
                    message: format!("读取用户 {} 的好友位置失败: {}", user.user_id, e),
                };
                let _ = deliver(&mut outbound, &error).await;
                return;
            }
        };
        for friend_location in &cached {
            if let Some(report) = self.report_if_nearby(&location, friend_location) {
                if deliver(&mut outbound, &report).await.is_err() {
                    return;
                }
            }
        }

        // 每个好友一条订阅；单个订阅失败不影响其余好友的接收
        let (updates_tx, mut updates_rx) = mpsc::channel::<UserLocation>(UPDATE_QUEUE_CAPACITY);
        let mut subscriptions: Vec<JoinHandle<()>> = Vec::with_capacity(friends.len());
        for friend in &friends {
            match self.bus.subscribe(&friend.user_id).await {
                Ok(updates) => {
                    subscriptions.push(tokio::spawn(forward_updates(updates, updates_tx.clone())));
                }
                Err(e) => {
                    tracing::warn!(
                        "Subscription to friend {} failed for user {}: {}",
                        friend.user_id,
                        user.user_id,
                        e
                    );
                }
            }
        }

        tracing::info!(
            "Session active for user {} with {} friends",
            user.user_id,
            friends.len()
        );

        // Active：同时等待连接上的下一条上报和任一好友的异步更新
        loop {
            tokio::select! {
                inbound_msg = inbound.next() => match inbound_msg {
                    Some(Ok(Message::Text(text))) => {
                        // 活跃阶段坏消息只跳过，不终止会话
                        let update = match serde_json::from_str::<UserLocation>(text.as_str()) {
                            Ok(update) => update,
                            Err(e) => {
                                tracing::warn!(
                                    "Skipping unparsable report from user {}: {}",
                                    user.user_id,
                                    e
                                );
                                continue;
                            }
                        };

                        // 临时的缓存故障不应当中断在线的流
                        if let Err(e) = self
                            .cache
                            .set_location(&update, self.location_ttl_secs)
                            .await
                        {
                            let error = StreamError {
                                code: error_codes::INTERNAL_ERROR,
                                message: format!(
                                    "缓存用户 {} 的位置失败: {}",
                                    update.user.user_id, e
                                ),
                            };
                            if deliver(&mut outbound, &error).await.is_err() {
                                break;
                            }
                            continue;
                        }
                        self.registry.set(update.clone());

                        // 广播给订阅了本用户的其他会话，失败只记录
                        if let Err(e) = self.bus.publish(&update).await {
                            tracing::warn!(
                                "Broadcasting location of user {} failed: {}",
                                update.user.user_id,
                                e
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("Connection error for user {}: {}", user.user_id, e);
                        break;
                    }
                },
                Some(friend_location) = updates_rx.recv() => {
                    // 以本地用户自己最近一次上报为基准重新判距；
                    // 注册表里还没有记录时跳过本次更新
                    let Some(own) = self.registry.get(&user.user_id) else {
                        continue;
                    };
                    if let Some(report) = self.report_if_nearby(&own, &friend_location) {
                        if deliver(&mut outbound, &report).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }

        // Closed：确定性回收每一条订阅，
        // 不能让回调继续打到已经死掉的连接上
        for subscription in subscriptions {
            subscription.abort();
        }
        drop(updates_tx);

        tracing::info!("Session closed for user {}", user.user_id);
    }

    /// 阈值之内返回距离报告，之外算完即弃
    fn report_if_nearby(&self, own: &UserLocation, friend: &UserLocation) -> Option<UserDistance> {
        let distance = geo::distance_miles(
            own.latitude,
            own.longitude,
            friend.latitude,
            friend.longitude,
        );
        if distance <= self.nearby_threshold_miles {
            Some(UserDistance {
                primary: own.user.clone(),
                remote: friend.user.clone(),
                distance,
                last_update_time: Utc::now(),
            })
        } else {
            None
        }
    }
}

/// 把一条订阅流上的更新搬运进会话队列，会话退出后随之结束
async fn forward_updates(mut updates: BoxStream<'static, UserLocation>, tx: mpsc::Sender<UserLocation>) {
    while let Some(update) = updates.next().await {
        if tx.send(update).await.is_err() {
            break;
        }
    }
}

async fn deliver<S, E>(outbound: &mut S, payload: &impl Serialize) -> Result<(), ()>
where
    S: Sink<Message, Error = E> + Unpin,
    E: Display,
{
    let json = serde_json::to_string(payload).map_err(|e| {
        tracing::error!("Failed to encode outbound payload: {}", e);
    })?;
    outbound
        .send(Message::Text(json.into()))
        .await
        .map_err(|e| {
            tracing::debug!("Failed to write to connection: {}", e);
        })
}
