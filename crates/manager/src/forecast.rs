use chrono::{Duration, NaiveTime};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use yosoku_core::common::time::TimeProvider;
use yosoku_core::common::{Stock, TimeFrame};
use yosoku_core::config::MarketConfig;
use yosoku_core::forecast::entity::{ForecastPoint, PriceSeries};
use yosoku_core::forecast::error::ForecastError;
use yosoku_core::market::error::MarketError;
use yosoku_core::market::port::MarketDataProvider;
use yosoku_model::prophet::{Prophet, ProphetConfig};

/// # Summary
/// Manager 层的统一错误类型。对外只暴露 `Display` 文本，不区分错误种类。
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error(transparent)]
    Market(#[from] MarketError),
    #[error(transparent)]
    Forecast(#[from] ForecastError),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Forecast task failed: {0}")]
    Task(String),
}

/// # Summary
/// 预测管理器，系统的应用服务层门面 (Facade)。
///
/// # Invariants
/// - 不持有任何跨请求的可变状态；每次调用都新建模型实例。
/// - `provider` 与 `clock` 在构造时由外部注入。
pub struct ForecastManager {
    // 行情数据源
    provider: Arc<dyn MarketDataProvider>,
    // 时钟，决定历史窗口的截止时间
    clock: Arc<dyn TimeProvider>,
    // 交易所后缀，例如 ".NS"
    suffix: String,
    // 历史窗口长度
    history: Duration,
    // K 线周期
    timeframe: TimeFrame,
    // 预测天数
    horizon: usize,
    // 每次请求新建模型时使用的超参数
    model_config: ProphetConfig,
}

impl ForecastManager {
    /// # Summary
    /// 创建 ForecastManager 实例。
    ///
    /// # Arguments
    /// * `provider` - 行情数据源的具体实现。
    /// * `clock` - 时间供给器。
    /// * `config` - 行情配置 (后缀、窗口、周期、预测天数)。
    ///
    /// # Returns
    /// * `Result<Arc<Self>, ManagerError>` - 周期字符串非法或窗口非正时返回 `Config` 错误。
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        clock: Arc<dyn TimeProvider>,
        config: &MarketConfig,
    ) -> Result<Arc<Self>, ManagerError> {
        let timeframe = TimeFrame::from_str(&config.interval).map_err(ManagerError::Config)?;
        if config.history_days <= 0 {
            return Err(ManagerError::Config(format!(
                "history_days must be positive, got {}",
                config.history_days
            )));
        }

        Ok(Arc::new(Self {
            provider,
            clock,
            suffix: config.suffix.clone(),
            history: Duration::days(config.history_days),
            timeframe,
            horizon: config.horizon,
            model_config: ProphetConfig::default(),
        }))
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// # Summary
    /// 为给定基础代码生成未来 `horizon` 天的预测。
    ///
    /// # Logic
    /// 1. 拼接交易所后缀，计算 `[now - history, now]` 窗口。
    /// 2. 通过 MarketDataProvider 抓取 K 线。
    /// 3. 折叠为 (交易日, 收盘价) 序列。
    /// 4. 在阻塞线程池中新建模型、拟合、构造未来日期框并预测。
    /// 5. 取最后 `horizon` 行，仅保留 `ds` 与 `yhat`。
    ///
    /// # Arguments
    /// * `symbol` - 调用方传入的基础代码，例如 `RELIANCE`。
    ///
    /// # Returns
    /// * 成功返回按日期升序的预测点；任一步骤失败返回 `ManagerError`。
    pub async fn predict(&self, symbol: &str) -> Result<Vec<ForecastPoint>, ManagerError> {
        let stock = Stock::listed(symbol, &self.suffix);
        let (start, end) = self.clock.lookback(self.history);

        let candles = self
            .provider
            .fetch_candles(&stock, self.timeframe, start, end)
            .await?;
        let series = PriceSeries::from_candles(&candles);
        debug!(
            symbol = %stock.symbol,
            candles = candles.len(),
            points = series.len(),
            "price series built"
        );

        let model = Prophet::new(self.model_config.clone());
        let horizon = self.horizon;
        let rows = tokio::task::spawn_blocking(move || {
            let fitted = model.fit(&series)?;
            let frame = fitted.make_future_frame(horizon);
            Ok::<_, ForecastError>(fitted.predict(&frame))
        })
        .await
        .map_err(|e| ManagerError::Task(e.to_string()))??;

        let skip = rows.len().saturating_sub(horizon);
        let points: Vec<ForecastPoint> = rows[skip..]
            .iter()
            .map(|row| ForecastPoint {
                ds: row.ds.and_time(NaiveTime::MIN),
                yhat: row.yhat,
            })
            .collect();

        info!(symbol = %stock.symbol, points = points.len(), "forecast generated");
        Ok(points)
    }
}
