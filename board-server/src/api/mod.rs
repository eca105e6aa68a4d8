//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`boards`] - 看板与列
//! - [`cards`] - 卡片与批量重排
//! - [`ws`] - 实时订阅 (WebSocket)

pub mod boards;
pub mod cards;
pub mod health;
pub mod ws;

use std::time::{Duration, Instant};

use axum::{Router, middleware};
use http::{HeaderValue, StatusCode};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::core::{Config, ServerState};
use crate::services::ReconciliationService;
use crate::utils::{AppError, AppResult};

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        target: "http_access",
        "{} {} {} {}ms",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );

    response
}

/// 按配置构造 CORS 层；未配置或来源非法时放开
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = config
        .cors_origin
        .as_deref()
        .and_then(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "Invalid CORS_ORIGIN, falling back to permissive CORS");
                None
            }
        });

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        None => {
            if config.is_production() {
                tracing::warn!("CORS_ORIGIN not set in production, any origin is allowed");
            }
            CorsLayer::permissive()
        }
    }
}

/// Build the REST routes (without state)
pub fn api_routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(boards::router())
        .merge(cards::router())
}

/// Build the full application with state and middleware
pub fn build_app(state: ServerState) -> Router {
    let timeout = Duration::from_millis(state.config.request_timeout_ms);
    let cors = cors_layer(&state.config);

    let rest = api_routes()
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout));

    rest.merge(ws::router())
        .with_state(state)
        .layer(cors)
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// 在阻塞线程池上执行服务调用 (redb 提交会 fsync)
pub(crate) async fn blocking<T, F>(state: &ServerState, f: F) -> AppResult<T>
where
    F: FnOnce(&ReconciliationService) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| AppError::internal(format!("Service task failed: {e}")))?
}
