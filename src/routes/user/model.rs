use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 系统内的用户，标识在注册时由服务端生成，创建后不再变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub nickname: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendshipRequest {
    pub user_id: String,
    pub friend_id: String,
}

/// 建表，幂等，启动时调用一次
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            nickname TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS friendships (
            user_id TEXT NOT NULL REFERENCES users(user_id),
            friend_id TEXT NOT NULL REFERENCES users(user_id),
            PRIMARY KEY (user_id, friend_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

impl User {
    pub async fn create(pool: &PgPool, nickname: &str) -> Result<Self, sqlx::Error> {
        let user_id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, nickname)
            VALUES ($1, $2)
            RETURNING user_id, nickname
            "#,
        )
        .bind(&user_id)
        .bind(nickname)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, user_id: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, nickname
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// 好友关系成对存储，单向查询即可覆盖全部好友
    pub async fn friends(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.nickname
            FROM friendships f
            JOIN users u ON f.friend_id = u.user_id
            WHERE f.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 尚未与该用户建立好友关系的其他用户
    pub async fn possible_friends(pool: &PgPool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.user_id, u.nickname
            FROM users u
            WHERE u.user_id != $1
              AND u.user_id NOT IN (
                  SELECT f.friend_id
                  FROM friendships f
                  WHERE f.user_id = $1
              )
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

pub struct Friendship;

impl Friendship {
    /// 互为好友，成对写入；重复建立为空操作
    pub async fn establish(
        pool: &PgPool,
        user_id: &str,
        friend_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO friendships (user_id, friend_id)
            VALUES ($1, $2), ($2, $1)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(friend_id)
        .execute(pool)
        .await?;

        Ok(())
    }
}
