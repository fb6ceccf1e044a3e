//! 数据模型模块
//! 用户记录与各端点的请求/响应结构

pub mod auth;
pub mod user;
