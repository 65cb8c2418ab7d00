//! # `yosoku-core` - 领域内核
//!
//! 只包含实体、错误与端口 (Trait) 定义，不依赖任何具体实现。
//! 行情适配器 (`yosoku-feed`)、预测模型 (`yosoku-model`) 与应用服务
//! (`yosoku-manager`) 均通过本 crate 的抽象进行协作。

pub mod common;
pub mod config;
pub mod forecast;
pub mod market;
