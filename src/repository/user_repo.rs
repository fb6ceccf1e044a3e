//! User repository (数据库访问层)

use crate::{
    error::AppError,
    models::user::{User, UserChanges},
};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// 用户存取接口
///
/// 修改类操作在目标不存在时返回 `Ok(None)`，由调用方决定如何报告。
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        is_superadmin: bool,
    ) -> Result<User, AppError>;
    async fn list(&self) -> Result<Vec<User>, AppError>;
    async fn promote_to_superadmin(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError>;
    /// 存储是否可用（用于就绪探针）
    async fn ping(&self) -> Result<(), AppError>;
}

/// PostgreSQL 实现
///
/// 每条语句从连接池借出连接，语句结束即归还。
#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

/// 唯一约束冲突转换为重复邮箱
fn map_unique_violation(e: sqlx::Error, email: &str) -> AppError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::DuplicateEmail(email.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    /// 根据邮箱查找用户
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 创建用户
    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        is_superadmin: bool,
    ) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, is_superadmin)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(is_superadmin)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, email))
    }

    /// 列出所有用户
    async fn list(&self) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at ASC")
            .fetch_all(&self.db)
            .await?;

        Ok(users)
    }

    /// 提升为超级管理员
    async fn promote_to_superadmin(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_superadmin = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// 更新用户
    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                is_superadmin = COALESCE($4, is_superadmin),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(changes.is_superadmin)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, changes.email.as_deref().unwrap_or_default()))
    }

    /// 删除用户，返回被删除的记录
    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 探测数据库，同时上报连接池水位
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.db).await.map_err(|e| {
            tracing::warn!(error = %e, "User database is unreachable");
            AppError::Internal(format!("database unreachable: {}", e))
        })?;

        metrics::gauge!("db.pool.size").set(self.db.size() as f64);
        metrics::gauge!("db.pool.idle").set(self.db.num_idle() as f64);
        Ok(())
    }
}
