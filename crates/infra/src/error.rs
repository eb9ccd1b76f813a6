//! # インフラ層エラー定義
//!
//! 外部サービス（S3、SMTP リレー）のクライアント構築時に発生するエラーを表現する。
//! リクエスト処理中の失敗は [`TemplateStoreError`](crate::template_store::TemplateStoreError)
//! と [`MailError`](order_notifier_domain::notification::MailError) で表す。
//!
//! ## 構造
//!
//! `std::io::Error` と同じ struct + enum パターンを採用:
//! - [`InfraError`]: エラー種別（[`InfraErrorKind`]）と [`SpanTrace`] を保持するラッパー
//! - [`InfraErrorKind`]: エラーの具体的な種別

use std::fmt;

use derive_more::Display;
use thiserror::Error;
use tracing_error::SpanTrace;

/// インフラ層で発生するエラー
///
/// エラー種別（[`InfraErrorKind`]）と [`SpanTrace`]（呼び出し経路）を保持する。
/// convenience constructor でエラーを生成すると、その時点のスパン情報が
/// 自動的にキャプチャされる。
#[derive(Display)]
#[display("{kind}")]
pub struct InfraError {
    kind:       InfraErrorKind,
    span_trace: SpanTrace,
}

/// インフラ層エラーの種別
#[derive(Debug, Error)]
pub enum InfraErrorKind {
    /// SMTP クライアントの構築に失敗（TLS 設定など）
    #[error("SMTP エラー: {0}")]
    Smtp(String),

    /// 設定値が不正
    ///
    /// 送信元アドレスの形式不正など、起動時に検出すべき誤り。
    #[error("入力エラー: {0}")]
    InvalidInput(String),
}

impl InfraError {
    /// エラー種別を取得する
    pub fn kind(&self) -> &InfraErrorKind {
        &self.kind
    }

    /// SpanTrace を取得する
    pub fn span_trace(&self) -> &SpanTrace {
        &self.span_trace
    }

    /// SMTP エラーを生成する
    pub fn smtp(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::Smtp(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }

    /// 設定値エラーを生成する
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self {
            kind:       InfraErrorKind::InvalidInput(msg.into()),
            span_trace: SpanTrace::capture(),
        }
    }
}

impl fmt::Debug for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfraError")
            .field("kind", &self.kind)
            .field("span_trace", &self.span_trace)
            .finish()
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.kind.source()
    }
}
