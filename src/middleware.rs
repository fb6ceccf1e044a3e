//! HTTP 中间件
//! 应用状态与请求追踪

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    auth::{JwtService, PasswordHasher},
    config::AppConfig,
    error::AppError,
    repository::UserRepository,
    services::{AuthService, UserService},
};

/// 应用状态
///
/// 所有服务在进程启动时显式构造，通过 axum State 注入到处理器。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn UserRepository>,
    pub jwt_service: Arc<JwtService>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
}

impl AppState {
    /// 基于配置和用户仓库组装全部服务
    pub fn new(config: AppConfig, users: Arc<dyn UserRepository>) -> Result<Self, AppError> {
        Self::with_hasher(config, users, PasswordHasher::new())
    }

    pub fn with_hasher(
        config: AppConfig,
        users: Arc<dyn UserRepository>,
        hasher: PasswordHasher,
    ) -> Result<Self, AppError> {
        let jwt_service = Arc::new(JwtService::from_config(&config)?);

        let auth_service = Arc::new(AuthService::new(
            users.clone(),
            jwt_service.clone(),
            hasher.clone(),
            config.security.clone(),
        ));
        let user_service = Arc::new(UserService::new(
            users.clone(),
            hasher,
            config.security.clone(),
        ));

        Ok(Self {
            config,
            users,
            jwt_service,
            auth_service,
            user_service,
        })
    }
}

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 当前请求的 request_id（仅在请求追踪中间件内有值）
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    let scoped_id = request_id.clone();
    async move {
        let start = Instant::now();

        // 错误响应里的 request_id 与响应头保持一致
        let mut response = REQUEST_ID.scope(scoped_id, next.run(req)).await;

        let elapsed = start.elapsed();

        // 指标标签只使用静态字符串
        let status = response.status().as_u16();
        let method_name = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            _ => "OTHER",
        };
        let status_code = match status {
            200 => "200",
            201 => "201",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_name, "status" => status_code)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
