//! Prophet 风格的加法预测模型。
//!
//! `y(t) = trend(t) + Σ seasonality(t) + ε`，其中趋势为分段线性，
//! 变点增量服从 Laplace 先验，季节系数服从 Gaussian 先验，截距与斜率不加约束。
//! 拟合即求 MAP：带逐列惩罚的最小二乘，Laplace 项用迭代重加权近似。

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;
use yosoku_core::forecast::entity::PriceSeries;
use yosoku_core::forecast::error::ForecastError;

use crate::features::{FeatureLayout, Seasonality, days_since_epoch, place_changepoints};
use crate::linalg::{cholesky_solve, normal_equations};

// 噪声标准差下限 (缩放后单位)，防止参数数接近样本数时插值退化
const MIN_SIGMA: f64 = 1e-3;
// |δ| 的下限，避免 IRLS 权重发散
const MIN_DELTA: f64 = 1e-4;
const CONVERGENCE_TOL: f64 = 1e-9;

/// 季节分量开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonalityMode {
    /// 根据历史跨度自动决定
    Auto,
    Enabled,
    Disabled,
}

/// # Summary
/// 模型超参数，默认值与 Prophet 一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProphetConfig {
    pub n_changepoints: usize,
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub interval_width: f64,
    pub weekly_seasonality: SeasonalityMode,
    pub yearly_seasonality: SeasonalityMode,
    pub max_iterations: usize,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.8,
            weekly_seasonality: SeasonalityMode::Auto,
            yearly_seasonality: SeasonalityMode::Auto,
            max_iterations: 50,
        }
    }
}

/// 预测输出的一行，包含各分量与区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub trend: f64,
    pub weekly: f64,
    pub yearly: f64,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
}

/// # Summary
/// 未拟合的模型。每次请求新建一个，`fit` 消耗输入并产出独立的 `FittedProphet`。
#[derive(Debug, Clone, Default)]
pub struct Prophet {
    config: ProphetConfig,
}

/// # Summary
/// 拟合完成的模型，持有预测所需的全部状态。
///
/// # Invariants
/// - `beta.len() == layout.n_cols()`。
/// - `history` 严格升序且至少两个日期。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FittedProphet {
    layout: FeatureLayout,
    beta: Vec<f64>,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    sigma_obs: f64,
    interval_z: f64,
    history: Vec<NaiveDate>,
}

impl Prophet {
    pub fn new(config: ProphetConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProphetConfig {
        &self.config
    }

    /// # Summary
    /// 在两列序列上拟合模型。
    ///
    /// # Logic
    /// 1. 校验至少 2 个观测点。
    /// 2. `y` 按绝对值最大值缩放，时间按历史跨度缩放到 [0, 1]。
    /// 3. 放置变点，按跨度决定启用哪些季节分量。
    /// 4. 迭代求解带惩罚的正规方程：每轮用残差更新噪声方差，
    ///    并按上一轮的 |δ| 重设变点惩罚，直到系数收敛。
    /// 5. 残差标准差还原到原始单位，用于预测区间。
    ///
    /// # Arguments
    /// * `series`: 升序、日期唯一的价格序列。
    ///
    /// # Returns
    /// 成功返回 `FittedProphet`；数据不足、非法或求解失败返回 `ForecastError`。
    pub fn fit(&self, series: &PriceSeries) -> Result<FittedProphet, ForecastError> {
        let n = series.len();
        if n < 2 {
            return Err(ForecastError::InsufficientData {
                required: 2,
                actual: n,
            });
        }

        let history: Vec<NaiveDate> = series.dates().collect();
        let values: Vec<f64> = series.values().collect();
        let start = history[0];
        let span_days = (history[n - 1] - start).num_days() as f64;
        if span_days <= 0.0 {
            return Err(ForecastError::InvalidData(
                "history must span at least one day".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidData(
                "series contains non-finite values".to_string(),
            ));
        }

        let y_scale = match values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())) {
            s if s > 0.0 => s,
            _ => 1.0,
        };
        let y: Vec<f64> = values.iter().map(|v| v / y_scale).collect();
        let t: Vec<f64> = history
            .iter()
            .map(|d| (*d - start).num_days() as f64 / span_days)
            .collect();

        let layout = FeatureLayout {
            changepoints: place_changepoints(
                &t,
                self.config.n_changepoints,
                self.config.changepoint_range,
            ),
            seasonalities: self.active_seasonalities(&history, span_days),
        };

        let rows: Vec<Vec<f64>> = t
            .iter()
            .zip(&history)
            .map(|(&ti, d)| layout.row(ti, days_since_epoch(*d)))
            .collect();

        let (beta, rss) = self.solve_map(&layout, &rows, &y)?;
        let sigma_obs = (rss / n as f64).sqrt() * y_scale;
        let interval_z = interval_quantile(self.config.interval_width)?;

        debug!(
            observations = n,
            changepoints = layout.changepoints.len(),
            seasonalities = layout.seasonalities.len(),
            sigma_obs,
            "prophet fitted"
        );

        Ok(FittedProphet {
            layout,
            beta,
            start,
            span_days,
            y_scale,
            sigma_obs,
            interval_z,
            history,
        })
    }

    fn active_seasonalities(&self, history: &[NaiveDate], span_days: f64) -> Vec<Seasonality> {
        let min_spacing = history
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .min()
            .unwrap_or(i64::MAX);

        let mut active = Vec::new();
        if is_enabled(self.config.yearly_seasonality, span_days >= 730.0) {
            active.push(Seasonality::yearly());
        }
        if is_enabled(
            self.config.weekly_seasonality,
            span_days >= 14.0 && min_spacing < 7,
        ) {
            active.push(Seasonality::weekly());
        }
        active
    }

    /// 迭代重加权的惩罚最小二乘，返回系数与缩放单位下的残差平方和
    fn solve_map(
        &self,
        layout: &FeatureLayout,
        rows: &[Vec<f64>],
        y: &[f64],
    ) -> Result<(Vec<f64>, f64), ForecastError> {
        let p = layout.n_cols();
        let n = y.len() as f64;
        let (xtx, xty) = normal_equations(rows, y, p);

        let mean = y.iter().sum::<f64>() / n;
        let mut sigma2 = (y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n)
            .max(MIN_SIGMA * MIN_SIGMA);
        let n_deltas = layout.changepoints.len();
        let delta_range = FeatureLayout::DELTA_START..FeatureLayout::DELTA_START + n_deltas;
        let b = self.config.changepoint_prior_scale;
        let s_season = self.config.seasonality_prior_scale;

        let mut beta = vec![0.0; p];
        // 首轮把 Laplace 先验当作同尺度的 Gaussian
        let mut delta_weight = vec![b; n_deltas];
        let mut rss = 0.0;

        for iteration in 0..self.config.max_iterations.max(1) {
            let mut a = xtx.clone();
            for j in 0..p {
                // 截距与斜率不加惩罚
                let penalty = if j < FeatureLayout::DELTA_START {
                    0.0
                } else if delta_range.contains(&j) {
                    sigma2 / (b * delta_weight[j - FeatureLayout::DELTA_START])
                } else {
                    sigma2 / (s_season * s_season)
                };
                a[j * p + j] += penalty;
            }

            let next = cholesky_solve(&a, &xty, p)?;
            let change = next
                .iter()
                .zip(&beta)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0_f64, f64::max);
            beta = next;

            rss = rows
                .iter()
                .zip(y)
                .map(|(row, target)| {
                    let fitted: f64 = row.iter().zip(&beta).map(|(x, c)| x * c).sum();
                    (target - fitted).powi(2)
                })
                .sum();
            sigma2 = (rss / n).max(MIN_SIGMA * MIN_SIGMA);
            for (w, delta) in delta_weight.iter_mut().zip(&beta[delta_range.clone()]) {
                *w = delta.abs().max(MIN_DELTA);
            }

            if iteration > 0 && change < CONVERGENCE_TOL {
                break;
            }
        }

        Ok((beta, rss))
    }
}

impl FittedProphet {
    /// # Summary
    /// 构造预测日期框：全部历史日期，后接最后一个历史日之后的 `periods` 个自然日。
    pub fn make_future_frame(&self, periods: usize) -> Vec<NaiveDate> {
        let mut frame = self.history.clone();
        if let Some(&last) = self.history.last() {
            frame.extend((1..=periods as u64).filter_map(|i| last.checked_add_days(Days::new(i))));
        }
        frame
    }

    /// # Summary
    /// 在任意日期上给出预测。
    ///
    /// # Logic
    /// 1. 日期换算为缩放时间与绝对天数，构造特征行。
    /// 2. 趋势列、各季节列分别与系数做内积并还原到原始单位。
    /// 3. `yhat = trend + weekly + yearly`，区间为 `yhat ∓ z·σ`。
    pub fn predict(&self, dates: &[NaiveDate]) -> Vec<ForecastRow> {
        let trend_cols = FeatureLayout::DELTA_START + self.layout.changepoints.len();

        dates
            .iter()
            .map(|&ds| {
                let t = (ds - self.start).num_days() as f64 / self.span_days;
                let row = self.layout.row(t, days_since_epoch(ds));
                let dot = |range: std::ops::Range<usize>| -> f64 {
                    row[range.clone()]
                        .iter()
                        .zip(&self.beta[range])
                        .map(|(x, c)| x * c)
                        .sum::<f64>()
                        * self.y_scale
                };

                let trend = dot(0..trend_cols);
                let mut weekly = 0.0;
                let mut yearly = 0.0;
                for (i, seasonality) in self.layout.seasonalities.iter().enumerate() {
                    let value = dot(self.layout.seasonal_range(i));
                    match seasonality.name.as_str() {
                        "weekly" => weekly += value,
                        _ => yearly += value,
                    }
                }

                let yhat = trend + weekly + yearly;
                let half_width = self.interval_z * self.sigma_obs;
                ForecastRow {
                    ds,
                    trend,
                    weekly,
                    yearly,
                    yhat,
                    yhat_lower: yhat - half_width,
                    yhat_upper: yhat + half_width,
                }
            })
            .collect()
    }

    pub fn history(&self) -> &[NaiveDate] {
        &self.history
    }

    /// 实际使用的变点日期
    pub fn changepoints(&self) -> Vec<NaiveDate> {
        self.layout
            .changepoints
            .iter()
            .filter_map(|&s| {
                let offset = (s * self.span_days).round() as u64;
                self.start.checked_add_days(Days::new(offset))
            })
            .collect()
    }

    pub fn seasonalities(&self) -> impl Iterator<Item = &str> {
        self.layout.seasonalities.iter().map(|s| s.name.as_str())
    }

    /// 残差标准差 (原始单位)
    pub fn sigma_obs(&self) -> f64 {
        self.sigma_obs
    }
}

fn is_enabled(mode: SeasonalityMode, auto: bool) -> bool {
    match mode {
        SeasonalityMode::Auto => auto,
        SeasonalityMode::Enabled => true,
        SeasonalityMode::Disabled => false,
    }
}

/// 双侧区间对应的标准正态分位数，如 0.8 -> 1.2816
fn interval_quantile(width: f64) -> Result<f64, ForecastError> {
    if !(width > 0.0 && width < 1.0) {
        return Err(ForecastError::InvalidData(format!(
            "interval_width must be in (0, 1), got {}",
            width
        )));
    }
    let normal = Normal::new(0.0, 1.0).map_err(|e| ForecastError::Numerical(e.to_string()))?;
    Ok(normal.inverse_cdf(0.5 + width / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_quantile() {
        let z = interval_quantile(0.8).unwrap();
        assert!((z - 1.281_551_565_5).abs() < 1e-6);
        assert!(interval_quantile(1.0).is_err());
        assert!(interval_quantile(0.0).is_err());
    }
}
