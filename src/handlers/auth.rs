//! 注册与登录的 HTTP 处理器

use crate::{
    error::AppError,
    extract::Json,
    middleware::AppState,
    models::{auth::*, user::RegisterRequest},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.auth_service.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User successfully created".to_string(),
            user: user.email,
        }),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let response = state.auth_service.login(req).await?;

    Ok(Json(response))
}
