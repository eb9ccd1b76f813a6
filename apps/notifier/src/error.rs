//! # Notifier エラー定義
//!
//! 通知パイプラインの各段階のエラーと、HTTP レスポンスへの変換を定義する。
//!
//! レスポンス本文はすべて `text/plain; charset=utf-8`。
//!
//! | エラー | ステータス | 本文 |
//! |-------|-----------|------|
//! | `Validation` | 400 | 検証メッセージ |
//! | `TemplateStore(BucketMissing / KeyMissing)` | 500 | エラーメッセージ |
//! | `Mail(AuthFailed)` | 401 | `Authentication failed` |
//! | `Mail(RecipientRefused)` | 500 | `Recipient refused {detail}` |
//! | 上記以外 | 500 | `Internal Server Error` |

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use order_notifier_domain::{DomainError, notification::MailError};
use order_notifier_infra::template_store::TemplateStoreError;
use order_notifier_shared::event_log::error::{category, kind};
use thiserror::Error;

use crate::usecase::notification::RenderError;

/// 詳細を返さない 500 レスポンスの本文
const INTERNAL_SERVER_ERROR_BODY: &str = "Internal Server Error";

/// 通知サービスで発生するエラー
#[derive(Debug, Error)]
pub enum NotifierError {
    /// リクエストの検証失敗
    #[error(transparent)]
    Validation(#[from] DomainError),

    /// テンプレート取得の失敗
    #[error(transparent)]
    TemplateStore(#[from] TemplateStoreError),

    /// テンプレートのレンダリング失敗
    #[error(transparent)]
    Render(#[from] RenderError),

    /// メール送信の失敗
    #[error(transparent)]
    Mail(#[from] MailError),
}

impl IntoResponse for NotifierError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            NotifierError::Validation(e) => {
                tracing::info!(error.category = category::VALIDATION, error = %e, "リクエストの検証に失敗");
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            NotifierError::TemplateStore(
                e @ (TemplateStoreError::BucketMissing { .. } | TemplateStoreError::KeyMissing { .. }),
            ) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::TEMPLATE_STORE,
                    error = %e,
                    "テンプレートが見つかりません"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            NotifierError::TemplateStore(e @ TemplateStoreError::Other(_)) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::TEMPLATE_STORE,
                    error = %e,
                    "テンプレートの取得に失敗"
                );
                internal_server_error()
            }
            NotifierError::Render(e) => {
                tracing::error!(
                    error.category = category::INTERNAL,
                    error.kind = kind::TEMPLATE_RENDER,
                    error = %e,
                    "テンプレートのレンダリングに失敗"
                );
                internal_server_error()
            }
            NotifierError::Mail(e @ MailError::AuthFailed) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::SMTP_AUTH,
                    "SMTP 認証に失敗"
                );
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            NotifierError::Mail(e @ MailError::RecipientRefused(_)) => {
                tracing::warn!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::SMTP_RECIPIENT,
                    error = %e,
                    "宛先がリレーに拒否されました"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
            NotifierError::Mail(e @ MailError::Transport(_)) => {
                tracing::error!(
                    error.category = category::EXTERNAL_SERVICE,
                    error.kind = kind::SMTP_TRANSPORT,
                    error = %e,
                    "SMTP 送信に失敗"
                );
                internal_server_error()
            }
            NotifierError::Mail(e @ MailError::InvalidMessage(_)) => {
                tracing::error!(
                    error.category = category::INTERNAL,
                    error.kind = kind::INVALID_MESSAGE,
                    error = %e,
                    "メールメッセージの構築に失敗"
                );
                internal_server_error()
            }
        };

        (status, body).into_response()
    }
}

fn internal_server_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        INTERNAL_SERVER_ERROR_BODY.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    async fn into_parts(err: NotifierError) -> (StatusCode, String, String) {
        let response = err.into_response();
        let status = response.status();
        let content_type = response
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[rstest]
    #[case::検証失敗(
        NotifierError::Validation(DomainError::Validation("missing field `id`".to_string())),
        StatusCode::BAD_REQUEST,
        "missing field `id`"
    )]
    #[case::キーなし(
        NotifierError::TemplateStore(TemplateStoreError::KeyMissing {
            bucket: "py-notifier".to_string(),
            key:    "order_received_template.html".to_string(),
        }),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Could not find the file \"order_received_template.html\" in the S3 bucket py-notifier"
    )]
    #[case::バケットなし(
        NotifierError::TemplateStore(TemplateStoreError::BucketMissing {
            bucket: "py-notifier".to_string(),
        }),
        StatusCode::INTERNAL_SERVER_ERROR,
        "The bucket py-notifier does not exist"
    )]
    #[case::その他のストアエラーは詳細を返さない(
        NotifierError::TemplateStore(TemplateStoreError::Other("AccessDenied".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error"
    )]
    #[case::認証失敗(
        NotifierError::Mail(MailError::AuthFailed),
        StatusCode::UNAUTHORIZED,
        "Authentication failed"
    )]
    #[case::宛先拒否(
        NotifierError::Mail(MailError::RecipientRefused("550 5.1.1 user unknown".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Recipient refused 550 5.1.1 user unknown"
    )]
    #[case::通信エラーは詳細を返さない(
        NotifierError::Mail(MailError::Transport("connection reset".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error"
    )]
    #[case::レンダリング失敗は詳細を返さない(
        NotifierError::Render(RenderError("unexpected end of input".to_string())),
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal Server Error"
    )]
    #[tokio::test]
    async fn test_エラーがステータスとプレーンテキスト本文に変換される(
        #[case] err: NotifierError,
        #[case] expected_status: StatusCode,
        #[case] expected_body: &str,
    ) {
        let (status, content_type, body) = into_parts(err).await;

        assert_eq!(status, expected_status);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert_eq!(body, expected_body);
    }
}
