//! # `yosoku-manager` - 应用服务层
//!
//! 编排一次预测请求：抓取行情 → 构建序列 → 拟合模型 → 截取预测尾部。
//! 编译期只依赖 `yosoku-core` 的端口与 `yosoku-model`，具体行情源由外部注入。

pub mod forecast;
