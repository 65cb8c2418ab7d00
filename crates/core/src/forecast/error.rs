use thiserror::Error;

/// # Summary
/// 预测模型域错误枚举，覆盖数据不足、数据非法与数值求解失败。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug, PartialEq)]
pub enum ForecastError {
    /// 有效观测点不足，无法拟合
    #[error("Dataframe has less than {required} non-NaN rows (got {actual})")]
    InsufficientData { required: usize, actual: usize },
    /// 输入数据非法，如时间跨度为零或包含非有限值
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// 线性方程组求解失败
    #[error("Numerical error: {0}")]
    Numerical(String),
}
