//! 设计矩阵的列布局：截距、斜率、变点铰链项、季节 Fourier 项。

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// 0001-01-01 到 1970-01-01 的天数
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// 距 1970-01-01 的天数，季节项以绝对时间计算以保证跨请求相位一致
pub fn days_since_epoch(date: NaiveDate) -> f64 {
    (i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE) as f64
}

/// 单个季节分量的定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seasonality {
    pub name: String,
    /// 周期 (天)
    pub period: f64,
    /// Fourier 阶数，产生 `2 * order` 列
    pub order: usize,
}

impl Seasonality {
    pub fn weekly() -> Self {
        Self {
            name: "weekly".to_string(),
            period: 7.0,
            order: 3,
        }
    }

    pub fn yearly() -> Self {
        Self {
            name: "yearly".to_string(),
            period: 365.25,
            order: 10,
        }
    }

    pub fn width(&self) -> usize {
        2 * self.order
    }

    fn push_terms(&self, epoch_days: f64, out: &mut Vec<f64>) {
        for k in 1..=self.order {
            let x = 2.0 * PI * k as f64 * epoch_days / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }
}

/// # Summary
/// 拟合后固定下来的列布局，训练与预测共用同一份。
///
/// # Invariants
/// - 列顺序：`[m, k, δ_1..δ_J, season_1.., season_2..]`。
/// - `changepoints` 为缩放后时间 (历史区间映射到 [0, 1])，严格递增。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureLayout {
    pub changepoints: Vec<f64>,
    pub seasonalities: Vec<Seasonality>,
}

impl FeatureLayout {
    pub const TREND_OFFSET: usize = 0;
    pub const TREND_SLOPE: usize = 1;
    pub const DELTA_START: usize = 2;

    pub fn n_cols(&self) -> usize {
        Self::DELTA_START
            + self.changepoints.len()
            + self.seasonalities.iter().map(Seasonality::width).sum::<usize>()
    }

    /// 第 `index` 个季节分量在设计矩阵中的列范围
    pub fn seasonal_range(&self, index: usize) -> std::ops::Range<usize> {
        let start = Self::DELTA_START
            + self.changepoints.len()
            + self.seasonalities[..index]
                .iter()
                .map(Seasonality::width)
                .sum::<usize>();
        start..start + self.seasonalities[index].width()
    }

    /// 构造一行特征
    pub fn row(&self, t: f64, epoch_days: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_cols());
        row.push(1.0);
        row.push(t);
        row.extend(
            self.changepoints
                .iter()
                .map(|&s| if t >= s { t - s } else { 0.0 }),
        );
        for seasonality in &self.seasonalities {
            seasonality.push_terms(epoch_days, &mut row);
        }
        row
    }
}

/// # Summary
/// 在历史前段均匀放置潜在变点。
///
/// # Logic
/// 1. 只在前 `range` 比例的观测中放置 (`hist_size = floor(n * range)`)。
/// 2. 变点数不超过 `hist_size - 1`。
/// 3. 在 `[0, hist_size - 1]` 上等距取 `J + 1` 个下标，去掉第一个 (即起点)。
///
/// # Arguments
/// * `t`: 各观测的缩放时间，升序。
/// * `requested`: 期望的变点数量。
/// * `range`: 放置变点的历史比例。
pub fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let n_changepoints = requested.min(hist_size.saturating_sub(1));
    if n_changepoints == 0 {
        return Vec::new();
    }

    let last = (hist_size - 1) as f64;
    let mut points: Vec<f64> = (1..=n_changepoints)
        .map(|i| {
            let idx = (last * i as f64 / n_changepoints as f64).round() as usize;
            t[idx]
        })
        .collect();
    points.dedup();
    points
}
