//! 业务服务层

pub mod auth_service;
pub mod user_service;

pub use auth_service::AuthService;
pub use user_service::UserService;
