use thiserror::Error;

/// # Summary
/// 行情抓取失败的原因。`Display` 文本会原样出现在接口的 `error` 字段中。
#[derive(Error, Debug)]
pub enum MarketError {
    /// 连接失败、读取响应体失败等传输层问题
    #[error("Network error: {0}")]
    Network(String),
    /// 超过配置的请求超时
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// 行情源返回非 2xx 且响应体里没有可读的错误说明
    #[error("Upstream returned HTTP {status}")]
    Upstream { status: u16 },
    /// 响应体无法解析
    #[error("Parse error: {0}")]
    Parse(String),
    /// 行情源明确表示无数据 (未知代码、已退市等)
    #[error("Data not found: {0}")]
    NotFound(String),
}
