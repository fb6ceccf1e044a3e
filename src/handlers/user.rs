//! 用户管理的 HTTP 处理器
//! 每个处理器都先经过服务层的超级管理员闸门

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::user::*,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 列出用户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let users = state.user_service.list_users(&auth_context).await?;

    let user_responses: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();

    Ok(Json(user_responses))
}

/// 提升为超级管理员
pub async fn promote_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.user_service.promote(&auth_context, &user_id).await?;

    Ok(Json(json!({
        "detail": "User successfully promoted to super admin"
    })))
}

/// 编辑用户
///
/// 请求体原样交给服务层，权限检查通过后才解析。
pub async fn edit_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.edit(&auth_context, &user_id, &body).await?;

    Ok(Json(json!({
        "detail": "User successfully updated",
        "user": UserResponse::from(user)
    })))
}

/// 删除用户
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_service.delete(&auth_context, &user_id).await?;

    Ok(Json(json!({
        "detail": "User successfully deleted",
        "user": user.email
    })))
}
