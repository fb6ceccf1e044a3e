//! 认证服务：注册、登录、初始超级管理员

use crate::{
    auth::{jwt::TokenSubject, JwtService, PasswordHasher},
    config::SecurityConfig,
    error::AppError,
    models::{auth::*, user::*},
    repository::UserRepository,
};
use std::sync::Arc;
use validator::Validate;

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    security: SecurityConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        jwt_service: Arc<JwtService>,
        hasher: PasswordHasher,
        security: SecurityConfig,
    ) -> Self {
        Self {
            users,
            jwt_service,
            hasher,
            security,
        }
    }

    /// 用户注册
    ///
    /// 先查重再校验请求体，重复邮箱无论载荷如何都报告为 `DuplicateEmail`。
    /// 注册出来的账户一律不是超级管理员。
    pub async fn register(&self, req: RegisterRequest) -> Result<User, AppError> {
        if self.users.find_by_email(&req.email).await?.is_some() {
            tracing::warn!(email = %req.email, "Registration failed: email is already registered");
            return Err(AppError::DuplicateEmail(req.email));
        }

        req.validate()?;
        PasswordHasher::validate_password_policy(&req.password, &self.security)?;

        let password_hash = self.hasher.hash(&req.password)?;

        let user = self
            .users
            .create(&req.email, &password_hash, false)
            .await
            .map_err(|e| {
                if let AppError::DuplicateEmail(email) = &e {
                    tracing::warn!(%email, "Registration failed: email is already registered");
                }
                e
            })?;

        tracing::info!(email = %user.email, user_id = %user.id, "User is registered");
        Ok(user)
    }

    /// 用户登录
    ///
    /// 令牌中的超级管理员标记取自登录这一刻的用户记录。
    pub async fn login(&self, req: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = match self.users.find_by_email(&req.email).await? {
            Some(user) if self.hasher.verify_password(&req.password, &user.password_hash) => user,
            _ => {
                tracing::warn!(email = %req.email, "Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        let access_token = self.jwt_service.create_access_token(
            &TokenSubject {
                sub: user.email.clone(),
                is_superadmin: user.is_superadmin,
            },
            None,
        )?;

        tracing::info!(email = %user.email, "User is logged in");
        Ok(LoginResponse::bearer(access_token))
    }

    /// 确保指定账户存在且为超级管理员
    ///
    /// 账户已存在时只提升权限，不改密码。
    pub async fn ensure_superadmin(&self, email: &str, password: &str) -> Result<User, AppError> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if existing.is_superadmin {
                tracing::debug!(%email, "Bootstrap superadmin already present");
                return Ok(existing);
            }

            let promoted = self
                .users
                .promote_to_superadmin(existing.id)
                .await?
                .ok_or(AppError::NotFound)?;
            tracing::info!(%email, "Existing user promoted to super admin at bootstrap");
            return Ok(promoted);
        }

        PasswordHasher::validate_password_policy(password, &self.security)?;
        let password_hash = self.hasher.hash(password)?;
        let user = self.users.create(email, &password_hash, true).await?;

        tracing::info!(%email, user_id = %user.id, "Bootstrap superadmin created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryUserRepository;
    use secrecy::Secret;

    fn security() -> SecurityConfig {
        SecurityConfig {
            jwt_secret: Secret::new("test_secret_key_32_characters_long!".to_string()),
            access_token_exp_secs: 900,
            password_min_length: 6,
            password_require_uppercase: false,
            password_require_digit: false,
            password_require_special: false,
        }
    }

    fn service() -> (AuthService, Arc<JwtService>, Arc<InMemoryUserRepository>) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let jwt = Arc::new(JwtService::new("test_secret_key_32_characters_long!", 900).unwrap());
        let service = AuthService::new(repo.clone(), jwt.clone(), PasswordHasher::new(), security());
        (service, jwt, repo)
    }

    fn register_req(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_forces_non_superadmin() {
        let (service, _, _) = service();
        let user = service.register(register_req("a@example.com", "secret1")).await.unwrap();
        assert!(!user.is_superadmin);
        assert_ne!(user.password_hash, "secret1");
    }

    #[tokio::test]
    async fn test_duplicate_checked_before_validation() {
        let (service, _, repo) = service();
        service.register(register_req("a@example.com", "secret1")).await.unwrap();

        // 密码过短也应先报告重复邮箱
        let err = service.register(register_req("a@example.com", "x")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email_and_weak_password() {
        let (service, _, repo) = service();

        let err = service.register(register_req("not-an-email", "secret1")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = service.register(register_req("a@example.com", "abc")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_issues_token_with_current_flag() {
        let (service, jwt, _) = service();
        service.register(register_req("a@example.com", "secret1")).await.unwrap();

        let response = service
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.token_type, "bearer");
        let claims = jwt.verify_token(&response.access_token).unwrap();
        assert_eq!(claims.sub, "a@example.com");
        assert!(!claims.is_superadmin);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _, _) = service();
        service.register(register_req("a@example.com", "secret1")).await.unwrap();

        let wrong_password = service
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "nope".to_string(),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginRequest {
                email: "ghost@example.com".to_string(),
                password: "secret1".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_ensure_superadmin_creates_then_is_idempotent() {
        let (service, _, repo) = service();

        let created = service.ensure_superadmin("root@example.com", "rootpass").await.unwrap();
        assert!(created.is_superadmin);

        let again = service.ensure_superadmin("root@example.com", "rootpass").await.unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_ensure_superadmin_promotes_existing_account() {
        let (service, _, _) = service();
        let user = service.register(register_req("a@example.com", "secret1")).await.unwrap();

        let promoted = service.ensure_superadmin("a@example.com", "ignored").await.unwrap();
        assert_eq!(promoted.id, user.id);
        assert!(promoted.is_superadmin);
    }
}
