//! 小规模稠密线性代数 (行主序扁平存储)。
//!
//! 设计矩阵只有几十列，手写 Cholesky 足够，不引入矩阵库。

use yosoku_core::forecast::error::ForecastError;

/// 计算正规方程 `XᵀX` 与 `Xᵀy`。
///
/// `rows` 中每一行长度必须等于 `p`。返回的 `XᵀX` 为 `p * p` 行主序。
pub fn normal_equations(rows: &[Vec<f64>], y: &[f64], p: usize) -> (Vec<f64>, Vec<f64>) {
    let mut xtx = vec![0.0; p * p];
    let mut xty = vec![0.0; p];

    for (row, &target) in rows.iter().zip(y) {
        for i in 0..p {
            let xi = row[i];
            if xi == 0.0 {
                continue;
            }
            xty[i] += xi * target;
            for j in i..p {
                xtx[i * p + j] += xi * row[j];
            }
        }
    }

    // 只累加了上三角
    for i in 0..p {
        for j in 0..i {
            xtx[i * p + j] = xtx[j * p + i];
        }
    }

    (xtx, xty)
}

/// # Summary
/// 用 Cholesky 分解求解对称正定方程组 `A x = b`。
///
/// # Logic
/// 1. 分解 `A = L Lᵀ`，对角元非正时判定为非正定。
/// 2. 前代求 `L z = b`。
/// 3. 回代求 `Lᵀ x = z`。
///
/// # Returns
/// 成功返回解向量，矩阵非正定返回 `ForecastError::Numerical`。
pub fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>, ForecastError> {
    if a.len() != n * n || b.len() != n {
        return Err(ForecastError::Numerical(format!(
            "dimension mismatch: {}x{} matrix, rhs of {}",
            n,
            n,
            b.len()
        )));
    }

    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }

            if i == j {
                if !sum.is_finite() || sum <= 0.0 {
                    return Err(ForecastError::Numerical(format!(
                        "matrix is not positive definite at pivot {}",
                        i
                    )));
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }

    Ok(x)
}
