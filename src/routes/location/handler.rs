use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
};

use crate::{
    AppState,
    cache::{RedisLocationBus, RedisLocationCache},
    session::ProximitySession,
};

/// 把进来的连接升级为 WebSocket 并交给邻近会话驱动。
/// 会话身份以流上第一条位置上报为准，路径里的用户标识只用于日志。
#[axum::debug_handler]
pub async fn stream_location(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        tracing::info!("Location stream connected (path user {})", user_id);

        let session = ProximitySession::new(
            RedisLocationCache::new(state.redis.clone()),
            RedisLocationBus::new(state.redis.clone()),
            state.pool.clone(),
            state.registry.clone(),
            state.config.nearby_threshold_miles,
            state.config.location_ttl_secs,
        );
        session.run(socket).await;

        tracing::info!("Location stream disconnected (path user {})", user_id);
    })
}
