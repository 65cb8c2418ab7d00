pub mod time;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 证券标的实体，代表一次预测请求所针对的股票。
///
/// # Invariants
/// - `symbol` 是发往行情源的完整代码 (含交易所后缀，例如 `RELIANCE.NS`)。
/// - 不对代码格式做校验，非法代码由行情源返回错误。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stock {
    // 完整行情代码 (例如: RELIANCE.NS, INFY.NS)
    pub symbol: String,
    // 交易所后缀 (可选，例如: .NS)
    pub exchange: Option<String>,
}

impl Stock {
    /// # Summary
    /// 由调用方提供的基础代码与固定交易所后缀拼装证券实体。
    ///
    /// # Logic
    /// 1. 直接拼接 `base + suffix`，不做大小写或空白处理。
    /// 2. 后缀为空时 `exchange` 记为 None。
    ///
    /// # Arguments
    /// * `base`: 调用方传入的基础代码，如 `RELIANCE`。
    /// * `suffix`: 交易所后缀，如 `.NS`。
    ///
    /// # Returns
    /// 返回拼装后的 Stock。
    pub fn listed(base: &str, suffix: &str) -> Self {
        Self {
            symbol: format!("{}{}", base, suffix),
            exchange: (!suffix.is_empty()).then(|| suffix.to_string()),
        }
    }
}

/// # Summary
/// 行情时间周期枚举，定义 K 线的时间跨度。
///
/// # Invariants
/// - 预测流程默认使用 `Day1`；日内周期会在构建价格序列时按交易日归并。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TimeFrame {
    // 1分钟
    Minute1,
    // 5分钟
    Minute5,
    // 1小时
    Hour1,
    // 1日
    Day1,
}

impl FromStr for TimeFrame {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" | "minute1" => Ok(TimeFrame::Minute1),
            "5m" | "minute5" => Ok(TimeFrame::Minute5),
            "1h" | "hour1" => Ok(TimeFrame::Hour1),
            "1d" | "day1" => Ok(TimeFrame::Day1),
            _ => Err(format!("Unknown TimeFrame: {}", s)),
        }
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Minute1 => write!(f, "1m"),
            TimeFrame::Minute5 => write!(f, "5m"),
            TimeFrame::Hour1 => write!(f, "1h"),
            TimeFrame::Day1 => write!(f, "1d"),
        }
    }
}
