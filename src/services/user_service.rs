//! 用户管理服务
//! 列表、提升、编辑、删除，全部只允许超级管理员调用

use crate::{
    auth::{AuthContext, PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    extract,
    models::user::*,
    repository::UserRepository,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub struct UserService {
    users: Arc<dyn UserRepository>,
    hasher: PasswordHasher,
    security: SecurityConfig,
}

/// 路径中的用户 ID 不是合法 UUID 时，视为用户不存在
pub fn parse_user_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| {
        tracing::warn!(user_id = %raw, "User not found: malformed id");
        AppError::NotFound
    })
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, hasher: PasswordHasher, security: SecurityConfig) -> Self {
        Self {
            users,
            hasher,
            security,
        }
    }

    /// 权限闸门：按令牌主体重新读取用户记录，以数据库中的当前标记为准
    ///
    /// 令牌里的 `is_superadmin` 不参与判断。主体已不存在时按无效令牌处理。
    pub async fn require_superadmin(&self, ctx: &AuthContext) -> Result<User, AppError> {
        let requesting_user = self.users.find_by_email(&ctx.email).await?.ok_or_else(|| {
            tracing::warn!(email = %ctx.email, "Token subject no longer exists");
            AppError::InvalidToken
        })?;

        if !requesting_user.is_superadmin {
            tracing::warn!(
                email = %ctx.email,
                token_is_superadmin = ctx.token_is_superadmin,
                "Insufficient rights"
            );
            return Err(AppError::Forbidden);
        }

        Ok(requesting_user)
    }

    /// 列出所有用户
    pub async fn list_users(&self, ctx: &AuthContext) -> Result<Vec<User>, AppError> {
        self.require_superadmin(ctx).await?;
        self.users.list().await
    }

    /// 提升为超级管理员
    pub async fn promote(&self, ctx: &AuthContext, user_id: &str) -> Result<User, AppError> {
        self.require_superadmin(ctx).await?;

        let id = parse_user_id(user_id)?;
        let user = self.users.promote_to_superadmin(id).await?.ok_or_else(|| {
            tracing::warn!(%user_id, "Promotion failed: user not found");
            AppError::NotFound
        })?;

        tracing::info!(email = %user.email, by = %ctx.email, "User promoted to super admin");
        Ok(user)
    }

    /// 编辑用户
    ///
    /// `body` 为 JSON 编码的 `UpdateUserRequest`，在权限检查之后才解析。
    pub async fn edit(&self, ctx: &AuthContext, user_id: &str, body: &[u8]) -> Result<User, AppError> {
        self.require_superadmin(ctx).await?;

        let id = parse_user_id(user_id)?;
        let req: UpdateUserRequest = extract::from_slice(body)?;
        req.validate()?;

        let password_hash = match &req.password {
            Some(password) => {
                PasswordHasher::validate_password_policy(password, &self.security)?;
                Some(self.hasher.hash(password)?)
            }
            None => None,
        };

        let changes = UserChanges {
            email: req.email,
            password_hash,
            is_superadmin: req.is_superadmin,
        };

        let user = self
            .users
            .update(id, &changes)
            .await
            .map_err(|e| {
                if let AppError::DuplicateEmail(email) = &e {
                    tracing::warn!(%user_id, %email, "Update failed: email is already registered");
                }
                e
            })?
            .ok_or_else(|| {
                tracing::warn!(%user_id, "Update failed: user not found");
                AppError::NotFound
            })?;

        tracing::info!(email = %user.email, by = %ctx.email, "User has been updated");
        Ok(user)
    }

    /// 删除用户
    pub async fn delete(&self, ctx: &AuthContext, user_id: &str) -> Result<User, AppError> {
        let requesting_user = self.require_superadmin(ctx).await?;

        let id = parse_user_id(user_id)?;
        let user = self.users.delete(id).await?.ok_or_else(|| {
            tracing::warn!(%user_id, "Deletion failed: user not found");
            AppError::NotFound
        })?;

        tracing::info!(
            by = %requesting_user.email,
            email = %user.email,
            "Super admin deleted user"
        );
        Ok(user)
    }
}
