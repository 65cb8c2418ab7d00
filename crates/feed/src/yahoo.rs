use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use yosoku_core::common::{Stock, TimeFrame};
use yosoku_core::config::MarketConfig;
use yosoku_core::market::entity::Candle;
use yosoku_core::market::error::MarketError;
use yosoku_core::market::port::MarketDataProvider;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// # Summary
/// Yahoo Finance 行情提供者实现。
///
/// # Invariants
/// - 使用 `reqwest` 异步客户端进行通讯，客户端自带超时。
/// - 只读取 v8 chart 接口，不做任何缓存。
#[derive(Clone)]
pub struct YahooProvider {
    /// 内部使用的 HTTP 客户端
    client: Client,
    /// chart 接口前缀，代码作为单独的路径段追加在其后
    base_url: Url,
}

impl YahooProvider {
    /// # Summary
    /// 按行情配置创建一个新的 YahooProvider 实例。
    ///
    /// # Logic
    /// 1. 安装进程级 rustls 加密实现 (已安装时忽略)。
    /// 2. 设置伪装浏览器 Header (User-Agent) 以减少被拦截风险。
    /// 3. 按配置设置请求超时并初始化 reqwest 客户端。
    /// 4. 解析 `base_url`，必须是可追加路径段的 http(s) 地址。
    ///
    /// # Arguments
    /// * `config`: 行情配置，读取 `timeout_secs` 与 `base_url`。
    ///
    /// # Returns
    /// 成功返回 YahooProvider；客户端构建失败返回 `MarketError::Network`，
    /// `base_url` 非法返回 `MarketError::Parse`。
    pub fn new(config: &MarketConfig) -> Result<Self, MarketError> {
        // 已有默认实现时返回 Err，属于正常情况
        if rustls::crypto::ring::default_provider()
            .install_default()
            .is_err()
        {
            debug!("rustls crypto provider already installed");
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static(BROWSER_USER_AGENT),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| MarketError::Network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            MarketError::Parse(format!("Invalid base_url {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(MarketError::Parse(format!(
                "base_url cannot take path segments: {}",
                config.base_url
            )));
        }

        Ok(Self { client, base_url })
    }
}

/// # Summary
/// Yahoo API 响应顶层结构。
///
/// # Invariants
/// - 映射自 Yahoo v8 chart 接口。
#[derive(Deserialize, Debug)]
struct YahooResponse {
    chart: YahooChart,
}

/// # Summary
/// Yahoo API 图表数据部分。
#[derive(Deserialize, Debug)]
struct YahooChart {
    result: Option<Vec<YahooResult>>,
    error: Option<YahooError>,
}

/// # Summary
/// Yahoo API 错误详情。
#[derive(Deserialize, Debug)]
struct YahooError {
    description: String,
}

/// # Summary
/// Yahoo API 单个时间序列结果。
///
/// # Invariants
/// - 无成交数据时 `timestamp` 字段整体缺失，按空列表处理。
#[derive(Deserialize, Debug)]
struct YahooResult {
    meta: YahooMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: YahooIndicators,
}

/// # Summary
/// 交易所元数据，仅关心时区偏移。
#[derive(Deserialize, Debug)]
struct YahooMeta {
    // 交易所相对 UTC 的偏移 (秒)，NSE 为 19800
    #[serde(default)]
    gmtoffset: i64,
}

/// # Summary
/// Yahoo API 指标容器。
#[derive(Deserialize, Debug)]
struct YahooIndicators {
    quote: Vec<YahooQuote>,
    // 调整后的价格数据
    adjclose: Option<Vec<YahooAdjClose>>,
}

/// # Summary
/// Yahoo API 调整后价格结构。
#[derive(Deserialize, Debug)]
struct YahooAdjClose {
    // 调整后的收盘价列表
    adjclose: Vec<Option<f64>>,
}

/// # Summary
/// Yahoo API 原始报价数据。
#[derive(Deserialize, Debug, Default)]
struct YahooQuote {
    /// 开盘价列表
    #[serde(default)]
    open: Vec<Option<f64>>,
    /// 最高价列表
    #[serde(default)]
    high: Vec<Option<f64>>,
    /// 最低价列表
    #[serde(default)]
    low: Vec<Option<f64>>,
    /// 收盘价列表
    #[serde(default)]
    close: Vec<Option<f64>>,
    /// 成交量列表
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// # Summary
/// 将 `TimeFrame` 映射为 Yahoo 识别的 interval 参数。
fn interval_param(timeframe: TimeFrame) -> &'static str {
    match timeframe {
        TimeFrame::Minute1 => "1m",
        TimeFrame::Minute5 => "5m",
        TimeFrame::Hour1 => "60m",
        TimeFrame::Day1 => "1d",
    }
}

/// # Summary
/// 解析 Yahoo v8 chart 接口的响应体。
///
/// # Logic
/// 1. 反序列化 JSON，`chart.error` 存在时直接转为 `MarketError::NotFound`。
/// 2. 读取 `meta.gmtoffset`，用交易所当地时区计算每根 K 线的交易日。
/// 3. 提取 adjclose 并与基础 OHLCV 合并，任一字段为 null 的行被跳过。
///
/// # Arguments
/// * `body`: 原始响应文本。
///
/// # Returns
/// 成功返回 K 线列表 (可能为空)，失败返回 MarketError。
pub fn parse_chart(body: &str) -> Result<Vec<Candle>, MarketError> {
    let json: YahooResponse =
        serde_json::from_str(body).map_err(|e| MarketError::Parse(e.to_string()))?;

    if let Some(err) = json.chart.error {
        return Err(MarketError::NotFound(err.description));
    }

    let result = json
        .chart
        .result
        .and_then(|mut results| results.pop())
        .ok_or_else(|| MarketError::NotFound("empty chart result".to_string()))?;

    let offset = i32::try_from(result.meta.gmtoffset)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            MarketError::Parse(format!("Invalid gmtoffset: {}", result.meta.gmtoffset))
        })?;

    let empty = YahooQuote::default();
    let quote = result.indicators.quote.first().unwrap_or(&empty);

    let adj_close_list = result
        .indicators
        .adjclose
        .as_ref()
        .and_then(|v| v.first())
        .map(|v| &v.adjclose);

    let mut candles = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let Some(time) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };

        if let (Some(o), Some(h), Some(l), Some(c), Some(v)) = (
            quote.open.get(i).and_then(|x| *x),
            quote.high.get(i).and_then(|x| *x),
            quote.low.get(i).and_then(|x| *x),
            quote.close.get(i).and_then(|x| *x),
            quote.volume.get(i).and_then(|x| *x),
        ) {
            let adj_c = adj_close_list.and_then(|list| list.get(i)).and_then(|x| *x);

            candles.push(Candle {
                time,
                trade_date: time.with_timezone(&offset).date_naive(),
                open: o,
                high: h,
                low: l,
                close: c,
                adj_close: adj_c,
                volume: v,
            });
        }
    }

    Ok(candles)
}

fn transport_error(e: reqwest::Error) -> MarketError {
    if e.is_timeout() {
        MarketError::Timeout(e.to_string())
    } else {
        MarketError::Network(e.to_string())
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    /// # Summary
    /// 从 Yahoo Finance 抓取 K 线历史数据。
    ///
    /// # Logic
    /// 1. 映射 TimeFrame 周期为 Yahoo 识别的 interval。
    /// 2. 把完整代码作为一个路径段追加 (`#`, `?`, `/` 会被转义)，附带 period1, period2。
    /// 3. 读取响应体；非 2xx 时优先透出 `chart.error.description`
    ///    (未知代码时 Yahoo 返回 404 并附带该字段)。
    /// 4. 交给 `parse_chart` 解析。
    ///
    /// # Arguments
    /// * `stock`: 证券实体。
    /// * `timeframe`: 周期。
    /// * `start`: 开始时间。
    /// * `end`: 结束时间。
    ///
    /// # Returns
    /// 成功返回 K 线列表，失败返回 MarketError。
    async fn fetch_candles(
        &self,
        stock: &Stock,
        timeframe: TimeFrame,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Candle>, MarketError> {
        let symbol = &stock.symbol;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                MarketError::Parse(format!(
                    "base_url cannot take path segments: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(symbol);
        let period1 = start.timestamp().to_string();
        let period2 = end.timestamp().to_string();

        let resp = self
            .client
            .get(url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", interval_param(timeframe)),
                ("includeAdjustedClose", "true"),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return match parse_chart(&body) {
                Err(MarketError::NotFound(msg)) => Err(MarketError::NotFound(msg)),
                _ => Err(MarketError::Upstream {
                    status: status.as_u16(),
                }),
            };
        }

        let candles = parse_chart(&body)?;
        debug!(
            symbol = %symbol,
            exchange = stock.exchange.as_deref().unwrap_or("-"),
            interval = %timeframe,
            count = candles.len(),
            "fetched candles"
        );
        Ok(candles)
    }
}
