//! # `yosoku-api` - HTTP API 网关
//!
//! 本 crate 是 Yosoku 预测服务的 HTTP 入口。
//! 使用 `axum` 构建路由与控制器，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 接收浏览器或脚本的 `GET /predict/{symbol}` 请求
//! - 调用下层 `ForecastManager` 完成抓取与拟合
//! - 将成功结果或错误信息统一包装为 200 响应体

pub mod routes;
pub mod server;
pub mod types;
