//! # Order Notifier 共有ユーティリティ
//!
//! 通知サービス全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - ビジネスロジックを含まない純粋なユーティリティのみを配置
//! - HTTP / tracing に依存するものは `observability` feature の背後に置く

#[cfg(feature = "observability")]
pub mod canonical_log;
pub mod event_log;
pub mod health;
pub mod observability;

pub use health::HealthResponse;
