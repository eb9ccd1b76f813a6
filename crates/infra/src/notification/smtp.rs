//! SMTP 通知送信実装
//!
//! 送信ごとにリレーへの接続を 1 本開き、AUTH → MAIL → RCPT → DATA の順に実行して
//! 必ず QUIT で閉じる。接続の再利用・プーリングは行わない。
//!
//! 失敗した段階に応じて [`MailError`] を返す:
//!
//! | 段階 | 拒否応答 | 通信エラー |
//! |------|---------|-----------|
//! | AUTH | `AuthFailed` | `Transport` |
//! | RCPT | `RecipientRefused` | `Transport` |
//! | その他 | `Transport` | `Transport` |

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use lettre::{
    Address,
    message::{Mailbox, Message, MultiPart, SinglePart, header::ContentType},
};
use order_notifier_domain::notification::{EmailMessage, MailError};

use super::{
    NotificationSender,
    relay::{RelayConnection, RelayConnector, RelayFailure, SmtpCredentials},
};
use crate::InfraError;

/// SMTP 通知送信
pub struct SmtpNotificationSender {
    connector:   Arc<dyn RelayConnector>,
    credentials: SmtpCredentials,
    timeout:     Duration,
}

impl SmtpNotificationSender {
    /// 新しい SMTP 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `connector`: リレーへの接続を開くコネクタ
    /// - `credentials`: SMTP 認証情報
    /// - `timeout`: 接続および各コマンド（AUTH / MAIL / RCPT / DATA / QUIT）の上限時間
    pub fn new(
        connector: Arc<dyn RelayConnector>,
        credentials: SmtpCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            connector,
            credentials,
            timeout,
        }
    }

    /// 接続後のコマンド列を実行する（QUIT は呼び出し側で行う）
    ///
    /// 各コマンドに個別の上限時間を設ける。
    async fn deliver(
        &self,
        connection: &mut dyn RelayConnection,
        envelope: &Envelope,
        message: &[u8],
    ) -> Result<(), MailError> {
        with_timeout(self.timeout, "AUTH", connection.authenticate(&self.credentials))
            .await?
            .map_err(|failure| match failure {
                RelayFailure::Rejected(detail) => {
                    tracing::warn!(detail = %detail, "SMTP 認証が拒否されました");
                    MailError::AuthFailed
                }
                RelayFailure::Transport(detail) => MailError::Transport(detail),
            })?;

        with_timeout(self.timeout, "MAIL FROM", connection.mail_from(&envelope.from))
            .await?
            .map_err(into_transport_error)?;

        with_timeout(self.timeout, "RCPT TO", connection.rcpt_to(&envelope.to))
            .await?
            .map_err(|failure| match failure {
                RelayFailure::Rejected(detail) => MailError::RecipientRefused(detail),
                RelayFailure::Transport(detail) => MailError::Transport(detail),
            })?;

        with_timeout(self.timeout, "DATA", connection.data(message))
            .await?
            .map_err(into_transport_error)?;

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for SmtpNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailError> {
        let (envelope, message) = prepare(email)?;

        let mut connection = with_timeout(self.timeout, "connect", self.connector.connect())
            .await?
            .map_err(into_transport_error)?;

        let result = self
            .deliver(connection.as_mut(), &envelope, &message)
            .await;

        // 成功・失敗にかかわらず接続を閉じる
        if with_timeout(self.timeout, "QUIT", connection.quit())
            .await
            .is_err()
        {
            tracing::debug!("SMTP QUIT がタイムアウトしたため接続を破棄します");
        }

        result
    }
}

/// 送信元・宛先アドレス（SMTP エンベロープ）
struct Envelope {
    from: Address,
    to:   Address,
}

/// エンベロープと `multipart/alternative` の HTML メール本文を構築する
fn prepare(email: &EmailMessage) -> Result<(Envelope, Vec<u8>), MailError> {
    let from: Mailbox = email
        .from
        .parse()
        .map_err(|e| MailError::InvalidMessage(format!("送信元アドレス不正: {e}")))?;
    let to: Mailbox = email
        .to
        .parse()
        .map_err(|e| MailError::InvalidMessage(format!("宛先アドレス不正: {e}")))?;

    let envelope = Envelope {
        from: from.email.clone(),
        to:   to.email.clone(),
    };

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(&email.subject)
        .multipart(
            MultiPart::alternative().singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(email.html_body.clone()),
            ),
        )
        .map_err(|e| MailError::InvalidMessage(format!("メッセージ構築失敗: {e}")))?;

    Ok((envelope, message.formatted()))
}

fn into_transport_error(failure: RelayFailure) -> MailError {
    match failure {
        RelayFailure::Rejected(detail) | RelayFailure::Transport(detail) => {
            MailError::Transport(detail)
        }
    }
}

async fn with_timeout<T>(
    timeout: Duration,
    step: &'static str,
    future: impl Future<Output = T>,
) -> Result<T, MailError> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| MailError::Transport(format!("SMTP {step} timed out after {timeout:?}")))
}

/// 送信元アドレスを検証する
///
/// 起動時に呼び、不正な `SMTP_SENDER` をリクエスト処理前に検出する。
pub fn validate_sender_address(address: &str) -> Result<(), InfraError> {
    address
        .parse::<Mailbox>()
        .map(|_| ())
        .map_err(|e| InfraError::invalid_input(format!("送信元アドレス不正 ({address}): {e}")))
}
