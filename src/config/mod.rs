use std::env;

use crate::geo;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    /// “附近”判定阈值，单位英里
    pub nearby_threshold_miles: f64,
    /// 位置缓存条目的过期时间，单位秒
    pub location_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            api_base_uri: env::var("API_BASE_URI").unwrap_or_else(|_| "/api".to_string()),
            nearby_threshold_miles: env::var("NEARBY_THRESHOLD_MILES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(geo::DEFAULT_NEARBY_THRESHOLD_MILES),
            location_ttl_secs: env::var("LOCATION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(600),
        })
    }
}
