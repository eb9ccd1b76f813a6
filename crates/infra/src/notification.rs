//! # 通知送信
//!
//! メール通知の送信を担当するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `NotificationSender` trait でメール送信を抽象化
//! - **2 つの実装**: SMTP（Implicit TLS のリレー経由）、Noop（ローカル確認用）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択

mod noop;
pub mod relay;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopNotificationSender;
use order_notifier_domain::notification::{EmailMessage, MailError};
pub use relay::{RelayConnection, RelayConnector, RelayFailure, SmtpCredentials, TlsRelayConnector};
pub use smtp::{SmtpNotificationSender, validate_sender_address};

/// メール送信トレイト
///
/// 通知基盤の中核。メール送信の具体的な方法を抽象化する。
/// 1 回の呼び出しで 1 通を送信し、成功時は `Ok(())` を返す。
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// メールを送信する
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailError>;
}
