use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::error;

/// 记录每个请求的来源、响应状态和耗时
pub async fn log_requests(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    tracing::info!("Request received: {} {} from {}", method, path, remote_addr);

    let start = Instant::now();
    let response = next.run(req).await;

    tracing::info!(
        "Response issued: {} {} -> {} in {:?}",
        method,
        path,
        response.status(),
        start.elapsed()
    );

    response
}

/// 服务端错误连同响应体一起写进日志，方便追查
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;

    if response.status().is_server_error() {
        let (mut parts, body) = response.into_parts();
        let bytes = match to_bytes(body, 1024).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Failed to read error response body: {}", e);
                return Response::from_parts(parts, Body::empty());
            }
        };
        let body_str = String::from_utf8_lossy(&bytes);

        error!(
            "Server error occurred - Status: {}, Body: {}",
            parts.status, body_str
        );

        // 重置body以便重新构建响应
        parts.headers.remove(axum::http::header::CONTENT_LENGTH);
        Response::from_parts(parts, Body::from(bytes))
    } else {
        response
    }
}
