//! # `yosoku-model` - 时间序列预测模型
//!
//! 提供与 Prophet 默认配置一致的加法模型：
//! 分段线性趋势 + 周/年 Fourier 季节项，以带先验的最小二乘 (MAP) 拟合。
//!
//! 典型用法：
//!
//! ```no_run
//! use yosoku_model::prophet::Prophet;
//! # fn demo(series: &yosoku_core::forecast::entity::PriceSeries) -> Result<(), yosoku_core::forecast::error::ForecastError> {
//! let fitted = Prophet::default().fit(series)?;
//! let future = fitted.make_future_frame(5);
//! let rows = fitted.predict(&future);
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

// 数值计算中下标与天数需要频繁转为 f64，数据规模远小于 2^52
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

pub mod features;
pub mod linalg;
pub mod prophet;
