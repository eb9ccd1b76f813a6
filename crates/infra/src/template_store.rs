//! # テンプレートストア（S3）
//!
//! メールテンプレートを Amazon S3 / MinIO から取得する。
//!
//! ## 設計方針
//!
//! - **キャッシュしない**: テンプレートはリクエストごとに取得する
//! - **固定バケット**: 起動時に決めたバケットの中で、テンプレート名をそのままオブジェクトキーにする
//! - **エラーの分類**: `NoSuchBucket` / `NoSuchKey` のみドメインエラーに変換し、
//!   それ以外は [`TemplateStoreError::Other`] にまとめる
//! - **リトライしない**: 1 回の取得につき 1 往復。上限時間は SDK のオペレーションタイムアウトで設定する
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use order_notifier_infra::template_store::{self, S3TemplateStore, TemplateStore};
//!
//! async fn setup() {
//!     let client = template_store::create_client(None, Duration::from_secs(10)).await;
//!     let store = S3TemplateStore::new(client, "py-notifier".to_string());
//!     let html = store.fetch("order_received_template.html").await;
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata},
};
use thiserror::Error;

/// テンプレートを保持するデフォルトのバケット名
pub const DEFAULT_TEMPLATE_BUCKET: &str = "py-notifier";

/// リージョンが解決できない場合のフォールバック（SMTP リレーと同じリージョン）
const FALLBACK_REGION: &str = "us-east-2";

/// テンプレート取得エラー
///
/// `BucketMissing` / `KeyMissing` の Display はそのまま 500 レスポンスの本文になる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateStoreError {
    /// バケットが存在しない
    #[error("The bucket {bucket} does not exist")]
    BucketMissing { bucket: String },

    /// オブジェクトキーが存在しない
    #[error("Could not find the file \"{key}\" in the S3 bucket {bucket}")]
    KeyMissing { bucket: String, key: String },

    /// 上記以外のストアエラー（権限不足、通信断、タイムアウト、UTF-8 でない本文など）
    ///
    /// リクエストは回復不能として扱う。詳細はログにのみ出力する。
    #[error("unexpected template store error: {0}")]
    Other(String),
}

/// テンプレートストアのインターフェース
///
/// テスト時はモックに差し替え可能。
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// テンプレートの内容を取得する
    ///
    /// # 引数
    ///
    /// * `template_name` - テンプレート名（= オブジェクトキー、例: `order_received_template.html`）
    ///
    /// # 戻り値
    ///
    /// UTF-8 でデコードしたテンプレート本文
    async fn fetch(&self, template_name: &str) -> Result<String, TemplateStoreError>;
}

/// S3 テンプレートストア
///
/// `aws-sdk-s3` を使用した [`TemplateStore`] の実装。MinIO とも互換動作する。
pub struct S3TemplateStore {
    client:      Client,
    bucket_name: String,
}

impl S3TemplateStore {
    pub fn new(client: Client, bucket_name: String) -> Self {
        Self {
            client,
            bucket_name,
        }
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

#[async_trait]
impl TemplateStore for S3TemplateStore {
    #[tracing::instrument(skip(self), fields(bucket = %self.bucket_name))]
    async fn fetch(&self, template_name: &str) -> Result<String, TemplateStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket_name)
            .key(template_name)
            .send()
            .await
            .map_err(|err| {
                let code = err.as_service_error().and_then(|e| e.code());
                classify_store_error(
                    code,
                    &self.bucket_name,
                    template_name,
                    DisplayErrorContext(&err).to_string(),
                )
            })?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| TemplateStoreError::Other(format!("オブジェクト本文の読み込みに失敗: {e}")))?
            .into_bytes();

        let content = decode_template(bytes.to_vec())?;
        tracing::debug!(size = content.len(), "テンプレートを取得しました");

        Ok(content)
    }
}

/// S3 のエラーコードをテンプレート取得エラーに変換する
fn classify_store_error(
    code: Option<&str>,
    bucket: &str,
    key: &str,
    detail: String,
) -> TemplateStoreError {
    match code {
        Some("NoSuchBucket") => TemplateStoreError::BucketMissing {
            bucket: bucket.to_string(),
        },
        Some("NoSuchKey") => TemplateStoreError::KeyMissing {
            bucket: bucket.to_string(),
            key:    key.to_string(),
        },
        _ => TemplateStoreError::Other(detail),
    }
}

fn decode_template(bytes: Vec<u8>) -> Result<String, TemplateStoreError> {
    String::from_utf8(bytes)
        .map_err(|e| TemplateStoreError::Other(format!("テンプレートが UTF-8 ではありません: {e}")))
}

/// S3 クライアントを作成する
///
/// `endpoint` が `Some` の場合は MinIO 等のカスタムエンドポイントに接続する。
/// `None` の場合は AWS S3 のデフォルトエンドポイントを使用する。
///
/// 認証情報とリージョンは SDK のデフォルトチェーンで解決する。
/// リージョンが見つからない場合は `us-east-2` を使う。
///
/// # 引数
///
/// * `endpoint` - カスタムエンドポイント URL（例: `http://localhost:19000`）
/// * `operation_timeout` - 1 回の取得（リトライ・本文受信を含む）の上限時間
pub async fn create_client(endpoint: Option<&str>, operation_timeout: Duration) -> Client {
    let region = aws_config::meta::region::RegionProviderChain::default_provider()
        .or_else(aws_config::Region::new(FALLBACK_REGION));

    let timeout_config = aws_config::timeout::TimeoutConfig::builder()
        .operation_timeout(operation_timeout)
        .build();

    let mut config_builder = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(region)
        .timeout_config(timeout_config)
        .retry_config(aws_config::retry::RetryConfig::disabled());

    if let Some(endpoint_url) = endpoint {
        config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let config = config_builder.load().await;

    // MinIO はパススタイルが必要（バーチャルホスト型 URL を使わない）
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
    let s3_config = if endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Client::from_conf(s3_config)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_no_such_bucketはbucket_missingに変換される() {
        let err = classify_store_error(
            Some("NoSuchBucket"),
            "py-notifier",
            "order_received_template.html",
            "service error".to_string(),
        );

        assert_eq!(
            err,
            TemplateStoreError::BucketMissing {
                bucket: "py-notifier".to_string(),
            }
        );
        assert_eq!(err.to_string(), "The bucket py-notifier does not exist");
    }

    #[test]
    fn test_no_such_keyはテンプレート名とバケット名を含むkey_missingに変換される() {
        let err = classify_store_error(
            Some("NoSuchKey"),
            "py-notifier",
            "order_shipped_template.html",
            "service error".to_string(),
        );

        assert!(matches!(err, TemplateStoreError::KeyMissing { .. }));
        let message = err.to_string();
        assert!(message.contains("order_shipped_template.html"));
        assert!(message.contains("py-notifier"));
        assert_eq!(
            message,
            "Could not find the file \"order_shipped_template.html\" in the S3 bucket py-notifier"
        );
    }

    #[test]
    fn test_その他のエラーコードはotherとして詳細を保持する() {
        let err = classify_store_error(
            Some("AccessDenied"),
            "py-notifier",
            "order_received_template.html",
            "AccessDenied: Access Denied".to_string(),
        );

        assert_eq!(
            err,
            TemplateStoreError::Other("AccessDenied: Access Denied".to_string())
        );
    }

    #[test]
    fn test_エラーコードがない場合はotherになる() {
        let err = classify_store_error(None, "py-notifier", "t.html", "dispatch failure".to_string());
        assert!(matches!(err, TemplateStoreError::Other(detail) if detail == "dispatch failure"));
    }

    #[test]
    fn test_utf8の本文はそのままデコードされる() {
        let content = decode_template("こんにちは {{customer_name}}".as_bytes().to_vec()).unwrap();
        assert_eq!(content, "こんにちは {{customer_name}}");
    }

    #[test]
    fn test_utf8でない本文はotherになる() {
        let result = decode_template(vec![0xff, 0xfe, 0x00]);
        assert!(matches!(result, Err(TemplateStoreError::Other(_))));
    }

    #[test]
    fn トレイトはsendとsyncを実装している() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<S3TemplateStore>();
    }
}
