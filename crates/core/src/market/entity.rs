use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 行情源返回的一根历史 K 线。
///
/// # Invariants
/// - `time` 为 K 线起始时刻 (UTC)，`trade_date` 为交易所当地的交易日，
///   两者可能落在不同的自然日 (例如 NSE 开盘 09:15 IST 对应前一天 UTC 深夜之后)。
/// - 价格字段均为有限值；缺字段的行在适配器内已被丢弃。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub trade_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    // 预测只使用此列
    pub close: f64,
    // 复权收盘价，行情源未提供时为 None
    pub adj_close: Option<f64>,
    pub volume: f64,
}
