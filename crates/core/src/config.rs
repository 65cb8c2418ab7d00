use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub market: MarketConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 行情抓取与预测窗口参数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// 追加到调用方代码之后的交易所后缀
    pub suffix: String,
    /// 历史窗口长度 (自然日)
    pub history_days: i64,
    /// K 线周期，按 `TimeFrame` 的字符串形式书写
    pub interval: String,
    /// 预测天数
    pub horizon: usize,
    /// 行情源请求超时 (秒)
    pub timeout_secs: u64,
    /// Yahoo chart 接口前缀，代码会追加在其后
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` 语法，`RUST_LOG` 优先
    pub filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            suffix: ".NS".to_string(),
            history_days: 365,
            interval: "1d".to_string(),
            horizon: 5,
            timeout_secs: 10,
            base_url: "https://query1.finance.yahoo.com/v8/finance/chart".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info,tower_http=info".to_string(),
        }
    }
}

impl ServerConfig {
    /// 监听地址，形如 `0.0.0.0:8000`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
