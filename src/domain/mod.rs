//! Core domain types and logic.

pub mod backtest;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod journal;
pub mod metrics;
pub mod news;
pub mod price_bar;
pub mod screener;
