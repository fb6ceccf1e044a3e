//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;

use crate::{handlers, middleware::AppState};

/// 请求体大小上限
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 注册与登录（无需认证）
    let auth_routes = Router::new()
        .route("/register/", post(handlers::auth::register))
        .route("/login/", post(handlers::auth::login));

    // 用户管理：需要 Bearer 令牌，超级管理员身份由处理器按数据库记录确认
    let authenticated_routes = Router::new()
        .route("/users/", get(handlers::user::list_users))
        .route("/users/promote/{user_id}", put(handlers::user::promote_user))
        .route("/users/edit/{user_id}", put(handlers::user::edit_user))
        .route("/users/delete/{user_id}", delete(handlers::user::delete_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.jwt_service.clone(),
            crate::auth::middleware::jwt_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .with_state(state)
}
