//! # Order Notifier インフラ層
//!
//! 外部システムとの接続・通信を担当するインフラストラクチャ層。
//!
//! ## 責務
//!
//! - **テンプレート取得**: S3 / MinIO からメールテンプレートを取得
//! - **メール送信**: SMTP リレー（Implicit TLS）経由でメールを送信
//!
//! ## 依存関係
//!
//! ```text
//! notifier → infra → domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`error`] - インフラ層エラー定義
//! - [`notification`] - メール送信
//! - [`template_store`] - テンプレート取得
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::{sync::Arc, time::Duration};
//!
//! use order_notifier_infra::{
//!     notification::{SmtpCredentials, SmtpNotificationSender, TlsRelayConnector},
//!     template_store::{self, S3TemplateStore},
//! };
//!
//! async fn setup() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = template_store::create_client(None, Duration::from_secs(10)).await;
//!     let store = S3TemplateStore::new(client, "py-notifier".to_string());
//!
//!     let timeout = Duration::from_secs(30);
//!     let connector = TlsRelayConnector::new("email-smtp.us-east-2.amazonaws.com", 465, timeout)?;
//!     let sender = SmtpNotificationSender::new(
//!         Arc::new(connector),
//!         SmtpCredentials::new("user", "pass"),
//!         timeout,
//!     );
//!
//!     Ok(())
//! }
//! ```

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod notification;
pub mod template_store;

pub use error::InfraError;
