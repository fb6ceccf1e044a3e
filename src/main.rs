//! 用户账户服务主入口

use account_service::{
    config::AppConfig,
    db,
    handlers::health,
    middleware::AppState,
    repository::{PgUserRepository, UserRepository},
    routes, telemetry,
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("account-service {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 加载 .env 文件（开发环境）
    // 按优先级加载：.env.local > .env.development > .env
    if let Ok(path) = std::env::var("ACCOUNT_ENV") {
        dotenv::from_filename(format!(".env.{}", path)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Account service starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 构建应用状态
    let users: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(db_pool.clone()));
    let app_state = Arc::new(AppState::new(config.clone(), users)?);

    // 5. 初始超级管理员
    match (
        &config.bootstrap.superadmin_email,
        &config.bootstrap.superadmin_password,
    ) {
        (Some(email), Some(password)) => {
            app_state
                .auth_service
                .ensure_superadmin(email, password.expose_secret())
                .await?;
        }
        _ => tracing::warn!("No bootstrap superadmin configured; user management requires an existing superadmin"),
    }

    // 6. 构建路由
    let app = routes::create_router(app_state);

    // 7. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 8. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    db_pool.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 优雅关闭信号处理
///
/// 收到信号后开始排空连接，超时仍未结束则强制退出。
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("account-service {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: account-service [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("环境变量（前缀 ACCOUNT_，层级分隔符 __）:");
    println!("  ACCOUNT_DATABASE__URL                    PostgreSQL 连接串（必填）");
    println!("  ACCOUNT_SECURITY__JWT_SECRET             JWT 签名密钥（至少 32 字符）");
    println!("  ACCOUNT_SECURITY__ACCESS_TOKEN_EXP_SECS  访问令牌有效期（秒）");
    println!("  ACCOUNT_BOOTSTRAP__SUPERADMIN_EMAIL      初始超级管理员邮箱");
    println!("  ACCOUNT_BOOTSTRAP__SUPERADMIN_PASSWORD   初始超级管理员密码");
}
