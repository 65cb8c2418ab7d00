use std::collections::HashMap;
use std::sync::Arc;

use config::{Config, ConfigError, Environment, File};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use yosoku_api::server::{AppState, start_server};
use yosoku_core::common::time::RealTimeProvider;
use yosoku_core::config::AppConfig;
use yosoku_feed::yahoo::YahooProvider;
use yosoku_manager::forecast::ForecastManager;

/// # Summary
/// 应用启动入口，纯粹的 DI 容器。
/// 负责实例化所有具体实现组件并通过 Arc<dyn Trait> 注入到 ForecastManager。
///
/// # Logic
/// 1. 读取 `.env` 与分层配置。
/// 2. 初始化全局日志。
/// 3. 实例化基础设施层（Yahoo 行情源、系统时钟）。
/// 4. 构造应用服务层（ForecastManager）。
/// 5. 启动 HTTP 服务，收到 Ctrl-C 后优雅退出。
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. 读取配置 (.env 缺失不是错误)
    let env_file = dotenvy::dotenv().ok();
    let config = load_config(None)?;

    // 2. 初始化日志，RUST_LOG 优先于配置
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))?;
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .init();
    info!("Yosoku starting...");
    if let Some(path) = env_file {
        info!("Loaded environment from {}", path.display());
    }

    // 3. 实例化基础设施层
    let feed = Arc::new(YahooProvider::new(&config.market)?);
    let clock = Arc::new(RealTimeProvider);

    // 4. 构造应用服务层（注入 Core Trait 抽象）
    let forecast_manager = ForecastManager::new(feed, clock, &config.market)?;
    info!(
        suffix = %config.market.suffix,
        history_days = config.market.history_days,
        horizon = forecast_manager.horizon(),
        "ForecastManager initialized"
    );

    // 5. 启动 HTTP 服务，阻塞直到退出信号
    let state = AppState { forecast_manager };
    start_server(state, &config.server.bind_addr(), shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

/// # Summary
/// 按优先级合并配置：内置默认值 < `config/default.toml` < `YOSOKU__` 环境变量。
///
/// # Arguments
/// * `env` - 替代进程环境变量的键值表，`None` 时读取真实环境。
fn load_config(env: Option<HashMap<String, String>>) -> Result<AppConfig, ConfigError> {
    Config::builder()
        .add_source(Config::try_from(&AppConfig::default())?)
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("YOSOKU")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(env),
        )
        .build()?
        .try_deserialize()
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            // 无法监听信号时不主动停机
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
