//! 内存用户仓库
//! 与 PostgreSQL 实现语义一致，集成测试不依赖真实数据库

use crate::{
    error::AppError,
    models::user::{User, UserChanges},
    repository::UserRepository,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryUserRepository {
    // 按创建顺序保存
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.iter().find(|u| u.email == email).cloned())
    }

    async fn create(
        &self,
        email: &str,
        password_hash: &str,
        is_superadmin: bool,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == email) {
            return Err(AppError::DuplicateEmail(email.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_superadmin,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.users.read().await.clone())
    }

    async fn promote_to_superadmin(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            user.is_superadmin = true;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;

        if let Some(email) = &changes.email {
            if users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(AppError::DuplicateEmail(email.clone()));
            }
        }

        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            if let Some(email) = &changes.email {
                user.email = email.clone();
            }
            if let Some(hash) = &changes.password_hash {
                user.password_hash = hash.clone();
            }
            if let Some(flag) = changes.is_superadmin {
                user.is_superadmin = flag;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        let index = users.iter().position(|u| u.id == id);
        Ok(index.map(|index| users.remove(index)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
