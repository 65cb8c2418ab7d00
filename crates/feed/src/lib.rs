//! # `yosoku-feed` - 行情适配器
//!
//! 实现 `yosoku_core::market::port::MarketDataProvider`，目前仅对接 Yahoo Finance。

pub mod yahoo;
