//! # ドメイン層エラー定義
//!
//! 受信した注文イベントがビジネスルールに違反している状態を表現するエラー型。
//!
//! ## エラーの種類と HTTP ステータスの対応
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `Validation` | 400 Bad Request | ペイロードの検証失敗 |
//!
//! メール送信の失敗は [`MailError`](crate::notification::MailError) で別に表現する。
//!
//! ## 使用例
//!
//! ```rust
//! use order_notifier_domain::DomainError;
//!
//! fn validate_name(name: &str) -> Result<(), DomainError> {
//!     if name.is_empty() {
//!         return Err(DomainError::Validation(
//!             "order_customer.name must not be empty".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// ドメイン層で発生するエラー
///
/// API 層でこのエラーを受け取り、400 Bad Request に変換する。
/// メッセージはそのままレスポンス本文になるため、英語で記述する。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// バリデーションエラー
    ///
    /// - 必須フィールドが未入力
    /// - 文字数制限の超過
    /// - 不正なフォーマット
    #[error("{0}")]
    Validation(String),
}
