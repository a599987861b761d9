use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::routes::user::model::User;

/// 连接上行的位置上报，同时也是广播到好友频道的载荷。
/// 用户字段平铺进顶层，与 HTTP 接口返回的用户结构保持一致。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserLocation {
    #[serde(flatten)]
    pub user: User,
    pub longitude: f64,
    pub latitude: f64,
    pub last_update_time: DateTime<Utc>,
}

/// 推送给连接方的好友距离报告，算出即发、发完即弃
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDistance {
    pub primary: User,
    pub remote: User,
    pub distance: f64,
    pub last_update_time: DateTime<Utc>,
}

/// 流上的结构化错误，错误码与 HTTP 接口共用一套
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    pub code: i32,
    pub message: String,
}
