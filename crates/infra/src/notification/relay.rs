//! SMTP リレー接続
//!
//! 1 通の送信に必要な SMTP コマンド（AUTH / MAIL / RCPT / DATA / QUIT）を
//! 個別に実行できる接続を抽象化する。
//!
//! lettre の `AsyncSmtpTransport::send` は認証から DATA までを一括で行うため、
//! 「認証失敗」と「宛先拒否」を区別できない。ここではコマンド単位の
//! `AsyncSmtpConnection` を使い、どの段階で失敗したかを呼び出し側に返す。

use std::{fmt, time::Duration};

use async_trait::async_trait;
use lettre::{
    Address,
    transport::smtp::{
        Error as SmtpError,
        authentication::{Credentials, Mechanism},
        client::{AsyncSmtpConnection, TlsParameters},
        commands::{Data, Mail, Rcpt},
        extension::ClientId,
    },
};

use crate::InfraError;

/// SMTP 認証情報
///
/// Debug 出力ではパスワードを伏せる。
#[derive(Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: String,
}

impl SmtpCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for SmtpCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpCredentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// SMTP コマンドの失敗
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayFailure {
    /// リレーがコマンドを拒否した（4xx / 5xx 応答）。応答内容をそのまま保持する
    Rejected(String),
    /// 接続断・タイムアウト・TLS など、応答以外の失敗
    Transport(String),
}

impl From<SmtpError> for RelayFailure {
    fn from(err: SmtpError) -> Self {
        if err.is_permanent() || err.is_transient() {
            Self::Rejected(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// リレーとの 1 本の接続
///
/// 1 回の送信でのみ使い、最後に必ず [`quit`](RelayConnection::quit) を呼ぶ。
#[async_trait]
pub trait RelayConnection: Send {
    /// AUTH
    async fn authenticate(&mut self, credentials: &SmtpCredentials) -> Result<(), RelayFailure>;

    /// MAIL FROM
    async fn mail_from(&mut self, from: &Address) -> Result<(), RelayFailure>;

    /// RCPT TO
    async fn rcpt_to(&mut self, to: &Address) -> Result<(), RelayFailure>;

    /// DATA + メッセージ本文
    async fn data(&mut self, message: &[u8]) -> Result<(), RelayFailure>;

    /// QUIT して接続を閉じる（失敗しても呼び出し側には返さない）
    async fn quit(&mut self);
}

/// リレーへの接続を開く
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn RelayConnection>, RelayFailure>;
}

/// lettre による実装（Implicit TLS）
///
/// 接続直後に TLS ハンドシェイクを行う（ポート 465、STARTTLS ではない）。
pub struct TlsRelayConnector {
    host:           String,
    port:           u16,
    timeout:        Duration,
    hello_name:     ClientId,
    tls_parameters: Option<TlsParameters>,
}

impl TlsRelayConnector {
    /// # 引数
    ///
    /// - `host`: リレーのホスト名（TLS 証明書の検証にも使う）
    /// - `port`: リレーのポート番号（Implicit TLS、通常 465）
    /// - `timeout`: 接続および各コマンドの上限時間
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, InfraError> {
        let tls_parameters = TlsParameters::new(host.to_string())
            .map_err(|e| InfraError::smtp(format!("TLS 設定の構築に失敗: {e}")))?;

        Ok(Self {
            host: host.to_string(),
            port,
            timeout,
            hello_name: ClientId::Domain("localhost".to_string()),
            tls_parameters: Some(tls_parameters),
        })
    }

    /// TLS なしで接続するコネクタ（ローカルの SMTP サーバー相手のテスト用）
    #[cfg(test)]
    fn without_tls(host: &str, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.to_string(),
            port,
            timeout,
            hello_name: ClientId::Domain("localhost".to_string()),
            tls_parameters: None,
        }
    }
}

#[async_trait]
impl RelayConnector for TlsRelayConnector {
    async fn connect(&self) -> Result<Box<dyn RelayConnection>, RelayFailure> {
        let connection = AsyncSmtpConnection::connect_tokio1(
            (self.host.as_str(), self.port),
            Some(self.timeout),
            &self.hello_name,
            self.tls_parameters.clone(),
            None,
        )
        .await
        .map_err(|e| RelayFailure::Transport(e.to_string()))?;

        tracing::debug!(host = %self.host, port = self.port, "SMTP リレーに接続しました");

        Ok(Box::new(TlsRelayConnection { inner: connection }))
    }
}

struct TlsRelayConnection {
    inner: AsyncSmtpConnection,
}

#[async_trait]
impl RelayConnection for TlsRelayConnection {
    async fn authenticate(&mut self, credentials: &SmtpCredentials) -> Result<(), RelayFailure> {
        let credentials =
            Credentials::new(credentials.username.clone(), credentials.password.clone());
        self.inner
            .auth(&[Mechanism::Plain, Mechanism::Login], &credentials)
            .await?;
        Ok(())
    }

    async fn mail_from(&mut self, from: &Address) -> Result<(), RelayFailure> {
        self.inner
            .command(Mail::new(Some(from.clone()), vec![]))
            .await?;
        Ok(())
    }

    async fn rcpt_to(&mut self, to: &Address) -> Result<(), RelayFailure> {
        self.inner.command(Rcpt::new(to.clone(), vec![])).await?;
        Ok(())
    }

    async fn data(&mut self, message: &[u8]) -> Result<(), RelayFailure> {
        self.inner.command(Data).await?;
        self.inner.message(message).await?;
        Ok(())
    }

    async fn quit(&mut self) {
        if let Err(e) = self.inner.quit().await {
            tracing::debug!(error = %e, "SMTP QUIT に失敗（接続は破棄済み）");
        }
    }
}
