use std::sync::Arc;

use config::Config;
use redis::Client as RedisClient;
use registry::LocationRegistry;
use sqlx::PgPool;

pub mod cache;
pub mod config;
pub mod geo;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod session;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub redis: Arc<RedisClient>,
    /// 进程内共享的最近位置表，所有会话共用一份
    pub registry: LocationRegistry,
}
