//! # 预测路由控制器
//!
//! 实现 `/predict/{symbol}` 接口。无论成功与否都返回 200，
//! 调用方通过响应体形状 (数组或 `{"error": ...}`) 区分结果。

use axum::Json;
use axum::extract::{Path, State};

use crate::server::AppState;
use crate::types::{ApiErrorResponse, PredictResponse};

/// 预测指定 NSE 股票未来 5 个自然日的收盘价
///
/// 拉取最近一年日线，每次请求重新拟合模型，返回最后 5 行的 `ds` 与 `yhat`。
#[utoipa::path(
    get,
    path = "/predict/{symbol}",
    tag = "预测 (Predict)",
    params(
        ("symbol" = String, Path, description = "不带交易所后缀的股票代码，例如 RELIANCE")
    ),
    responses(
        (status = 200, description = "预测结果数组，或包含错误信息的对象", body = PredictResponse)
    )
)]
pub async fn predict(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Json<PredictResponse> {
    match state.forecast_manager.predict(&symbol).await {
        Ok(points) => Json(PredictResponse::Forecast(points)),
        Err(e) => {
            tracing::warn!(symbol = %symbol, error = %e, "prediction failed");
            Json(PredictResponse::Error(ApiErrorResponse::from_msg(e.to_string())))
        }
    }
}
