use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use nearby_friends::{
    AppState,
    config::Config,
    middleware::{log_errors, log_requests},
    registry::LocationRegistry,
    routes,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'nearby_friends_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    // 初始化数据表，幂等
    routes::user::model::ensure_schema(&pool)
        .await
        .expect("Failed to initialize database schema");

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client");

    // 设置应用状态；位置注册表为进程内所有会话共享
    let state = AppState {
        pool,
        config: config.clone(),
        redis: Arc::new(redis_client),
        registry: LocationRegistry::new(),
    };

    let user_routes = Router::new()
        .route("/users/register", post(routes::user::register))
        .route("/users/friendship", post(routes::user::create_friendship))
        .route("/users/{id}/friends", get(routes::user::list_friends))
        .route(
            "/users/{id}/possible-friends",
            get(routes::user::possible_friends),
        )
        // 位置流：升级为 WebSocket 之后由邻近会话接管
        .route("/users/{id}/location", get(routes::location::stream_location));

    let router = Router::new()
        .route("/health", get(routes::ping))
        .nest(&config.api_base_uri.clone(), user_routes);

    // 添加日志中间件
    let router = router
        .layer(axum::middleware::from_fn(log_errors))
        .layer(axum::middleware::from_fn(log_requests));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 添加应用状态
    let app = router.with_state(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
