use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    AppState,
    utils::{error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateUserRequest, Friendship, FriendshipRequest, User};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    // 昵称不能为空
    let nickname = req.nickname.trim();
    if nickname.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(error_codes::VALIDATION_ERROR, "昵称不能为空".to_string()),
        );
    }

    match User::create(&state.pool, nickname).await {
        Ok(user) => {
            tracing::info!("Created user {} ({})", user.user_id, user.nickname);
            (StatusCode::CREATED, success_to_api_response(user))
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(error_codes::INTERNAL_ERROR, format!("创建用户失败: {}", e)),
        ),
    }
}

#[axum::debug_handler]
pub async fn create_friendship(
    State(state): State<AppState>,
    Json(req): Json<FriendshipRequest>,
) -> impl IntoResponse {
    if req.user_id == req.friend_id {
        return (
            StatusCode::BAD_REQUEST,
            error_to_api_response(
                error_codes::VALIDATION_ERROR,
                "不能添加自己为好友".to_string(),
            ),
        );
    }

    // 两侧用户都必须已经注册
    for user_id in [&req.user_id, &req.friend_id] {
        match User::find_by_id(&state.pool, user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    error_to_api_response(
                        error_codes::NOT_FOUND,
                        format!("用户 {} 不存在", user_id),
                    ),
                );
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_to_api_response(error_codes::INTERNAL_ERROR, format!("数据库错误: {}", e)),
                );
            }
        }
    }

    match Friendship::establish(&state.pool, &req.user_id, &req.friend_id).await {
        Ok(()) => (
            StatusCode::CREATED,
            success_to_api_response(serde_json::json!({
                "success": true
            })),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(
                error_codes::INTERNAL_ERROR,
                format!("建立好友关系失败: {}", e),
            ),
        ),
    }
}

#[axum::debug_handler]
pub async fn list_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match User::friends(&state.pool, &user_id).await {
        Ok(friends) => (StatusCode::OK, success_to_api_response(friends)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(
                error_codes::INTERNAL_ERROR,
                format!("查询好友列表失败: {}", e),
            ),
        ),
    }
}

#[axum::debug_handler]
pub async fn possible_friends(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match User::possible_friends(&state.pool, &user_id).await {
        Ok(users) => (StatusCode::OK, success_to_api_response(users)),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_to_api_response(
                error_codes::INTERNAL_ERROR,
                format!("查询可添加好友失败: {}", e),
            ),
        ),
    }
}
