use crate::market::entity::Candle;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// # Summary
/// 价格序列中的单个观测点 (`ds`, `y`)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    // 交易日
    pub ds: NaiveDate,
    // 收盘价
    pub y: f64,
}

/// # Summary
/// 喂给预测模型的两列时间序列，生命周期仅限单次请求。
///
/// # Invariants
/// - 按 `ds` 严格升序，同一交易日只保留一个点。
/// - 所有 `y` 均为有限值。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// # Summary
    /// 从任意顺序的 (日期, 价格) 对构建序列。
    ///
    /// # Logic
    /// 1. 丢弃 NaN / 无穷值。
    /// 2. 以日期为键归并，同日多个值保留最后出现的一个。
    /// 3. 按日期升序输出。
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let by_date: BTreeMap<NaiveDate, f64> = points
            .into_iter()
            .filter(|(_, y)| y.is_finite())
            .collect();

        Self {
            points: by_date
                .into_iter()
                .map(|(ds, y)| PricePoint { ds, y })
                .collect(),
        }
    }

    /// # Summary
    /// 将 K 线列表折叠为 (交易日, 收盘价) 序列。
    ///
    /// # Logic
    /// 1. 取每根 K 线的 `trade_date` 与 `close`。
    /// 2. 日内周期的多根 K 线按交易日归并，保留当日最后一根的收盘价。
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut ordered: Vec<&Candle> = candles.iter().collect();
        ordered.sort_by_key(|c| c.time);
        Self::from_points(ordered.into_iter().map(|c| (c.trade_date, c.close)))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.ds)
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.y)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.ds)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.ds)
    }
}

/// # Summary
/// 单个预测点，即接口响应数组中的一个元素。
///
/// # Invariants
/// - 字段名与模型内部的通用列名保持一致 (`ds`, `yhat`)，不做重命名。
/// - `ds` 序列化为不带时区的 ISO 8601 时间 (`2024-02-01T00:00:00`)。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastPoint {
    /// 预测日期
    #[schema(value_type = String, example = "2024-02-01T00:00:00")]
    pub ds: NaiveDateTime,
    /// 点估计值
    #[schema(example = 2875.42)]
    pub yhat: f64,
}
