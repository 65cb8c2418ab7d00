//! # DTO (Data Transfer Object) 层
//!
//! 面向前端 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use yosoku_core::forecast::entity::ForecastPoint;

/// 预测接口响应体
///
/// 不带标签序列化：成功时直接是数组，失败时是 `{"error": "..."}`。
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PredictResponse {
    /// 按日期升序的预测点
    Forecast(Vec<ForecastPoint>),
    /// 任一环节失败时的错误信息
    Error(ApiErrorResponse),
}

/// 错误响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 错误描述信息
    #[schema(example = "Dataframe has less than 2 non-NaN rows (got 0)")]
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

/// 存活探针响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "alive")]
    pub status: String,
    #[schema(example = "0.1.0")]
    pub version: String,
}
