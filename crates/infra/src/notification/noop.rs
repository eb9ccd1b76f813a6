//! Noop 通知送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! SMTP リレーの認証情報がないローカル環境で使用する。

use async_trait::async_trait;
use order_notifier_domain::notification::{EmailMessage, MailError};

use super::NotificationSender;

/// Noop 通知送信（ログ出力のみ）
#[derive(Debug, Clone)]
pub struct NoopNotificationSender;

#[async_trait]
impl NotificationSender for NoopNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            from = %email.from,
            to = %email.to,
            subject = %email.subject,
            body_size = email.html_body.len(),
            "Noop: メール送信をスキップ"
        );
        Ok(())
    }
}
