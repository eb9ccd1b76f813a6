//! # Order Notifier ドメイン層
//!
//! 注文通知のドメインモデルを定義する。
//!
//! ## 依存関係の方向
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ドメイン層はインフラ層（S3、SMTP）には一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`error`] - ドメイン層で発生するエラーの定義
//! - [`order`] - 注文 ID・顧客の値オブジェクト
//! - [`notification`] - 通知イベント、レンダリングコンテキスト、メール

pub mod error;
pub mod notification;
pub mod order;

pub use error::DomainError;
