//! # Notifier 設定
//!
//! 環境変数から通知サービスの設定を読み込む。
//! 起動時に 1 度だけ構築し、以降は読み取り専用で各コンポーネントに渡す。

use std::{env, time::Duration};

use order_notifier_infra::{notification::SmtpCredentials, template_store::DEFAULT_TEMPLATE_BUCKET};
use thiserror::Error;

/// SMTP リレーのデフォルトホスト（Amazon SES、us-east-2）
const DEFAULT_SMTP_HOST: &str = "email-smtp.us-east-2.amazonaws.com";
/// Implicit TLS のポート
const DEFAULT_SMTP_PORT: u16 = 465;
const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_TEMPLATE_FETCH_TIMEOUT_SECS: u64 = 10;
/// Noop バックエンドで `SMTP_SENDER` が未設定の場合の送信元
const NOOP_SENDER: &str = "order-notifier@localhost";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// 必須の環境変数が未設定
    #[error("{name} が設定されていません")]
    Missing { name: &'static str },

    /// 値の形式が不正
    #[error("{name} の値が不正です: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// 通知サービスの設定
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// バインドアドレス
    pub host:         String,
    /// ポート番号
    pub port:         u16,
    /// テンプレート取得の設定
    pub template:     TemplateConfig,
    /// 通知送信の設定
    pub notification: NotificationConfig,
}

/// テンプレート取得（S3）の設定
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// テンプレートを保持するバケット名
    pub bucket_name:   String,
    /// S3 エンドポイント URL（MinIO 使用時に設定、未設定で AWS S3 デフォルト）
    pub endpoint_url:  Option<String>,
    /// 1 回の取得の上限時間
    pub fetch_timeout: Duration,
}

/// 通知送信の設定
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// 送信バックエンド
    pub backend: NotificationBackend,
    /// 送信元メールアドレス（From ヘッダー / MAIL FROM）
    pub sender:  String,
}

/// 送信バックエンド
///
/// `NOTIFICATION_BACKEND` 環境変数で切り替える:
/// - `smtp`: SMTP リレー経由で送信（デフォルト）
/// - `noop`: 送信しない（ログ出力のみ）
#[derive(Debug, Clone)]
pub enum NotificationBackend {
    Smtp(SmtpConfig),
    Noop,
}

/// SMTP リレーの設定
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host:        String,
    pub port:        u16,
    /// 接続および各コマンドの上限時間
    pub timeout:     Duration,
    pub credentials: SmtpCredentials,
}

impl NotifierConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars { lookup };

        Ok(Self {
            host:         vars
                .get("NOTIFIER_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port:         vars.parse_or("NOTIFIER_PORT", 5000)?,
            template:     TemplateConfig::from_vars(&vars)?,
            notification: NotificationConfig::from_vars(&vars)?,
        })
    }
}

impl TemplateConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        Ok(Self {
            bucket_name:   vars
                .get("TEMPLATE_BUCKET_NAME")
                .unwrap_or_else(|| DEFAULT_TEMPLATE_BUCKET.to_string()),
            endpoint_url:  vars.get("S3_ENDPOINT_URL"),
            fetch_timeout: vars.seconds_or(
                "TEMPLATE_FETCH_TIMEOUT_SECS",
                DEFAULT_TEMPLATE_FETCH_TIMEOUT_SECS,
            )?,
        })
    }
}

impl NotificationConfig {
    fn from_vars<F: Fn(&str) -> Option<String>>(vars: &Vars<F>) -> Result<Self, ConfigError> {
        let backend = vars
            .get("NOTIFICATION_BACKEND")
            .unwrap_or_else(|| "smtp".to_string());

        match backend.as_str() {
            "smtp" => {
                let smtp = SmtpConfig {
                    host:        vars
                        .get("SMTP_HOST")
                        .unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    port:        vars.parse_or("SMTP_PORT", DEFAULT_SMTP_PORT)?,
                    timeout:     vars.seconds_or("SMTP_TIMEOUT_SECS", DEFAULT_SMTP_TIMEOUT_SECS)?,
                    credentials: SmtpCredentials::new(
                        vars.require("SMTP_USER")?,
                        vars.require("SMTP_PASS")?,
                    ),
                };
                Ok(Self {
                    backend: NotificationBackend::Smtp(smtp),
                    sender:  vars.require("SMTP_SENDER")?,
                })
            }
            "noop" => Ok(Self {
                backend: NotificationBackend::Noop,
                sender:  vars
                    .get("SMTP_SENDER")
                    .unwrap_or_else(|| NOOP_SENDER.to_string()),
            }),
            _ => Err(ConfigError::Invalid {
                name:  "NOTIFICATION_BACKEND",
                value: backend,
            }),
        }
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn require(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing { name })
    }

    fn parse_or<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }

    /// 秒数を読み込む（0 は不正）
    fn seconds_or(&self, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let secs = self.parse_or(name, default)?;
        if secs == 0 {
            return Err(ConfigError::Invalid {
                name,
                value: secs.to_string(),
            });
        }
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<NotifierConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotifierConfig::from_lookup(|name| map.get(name).cloned())
    }

    const SMTP_VARS: [(&str, &str); 3] = [
        ("SMTP_USER", "AKIAEXAMPLE"),
        ("SMTP_PASS", "secret"),
        ("SMTP_SENDER", "orders@example.com"),
    ];

    #[test]
    fn test_smtp必須項目のみでデフォルト値が使われる() {
        let config = load(&SMTP_VARS).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.template.bucket_name, "py-notifier");
        assert_eq!(config.template.endpoint_url, None);
        assert_eq!(config.template.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.notification.sender, "orders@example.com");

        let NotificationBackend::Smtp(smtp) = config.notification.backend else {
            panic!("smtp バックエンドであること");
        };
        assert_eq!(smtp.host, "email-smtp.us-east-2.amazonaws.com");
        assert_eq!(smtp.port, 465);
        assert_eq!(smtp.timeout, Duration::from_secs(30));
        assert_eq!(smtp.credentials.username, "AKIAEXAMPLE");
    }

    #[test]
    fn test_環境変数で上書きできる() {
        let mut vars = SMTP_VARS.to_vec();
        vars.extend([
            ("NOTIFIER_PORT", "8080"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_PORT", "2465"),
            ("TEMPLATE_BUCKET_NAME", "order-templates"),
            ("S3_ENDPOINT_URL", "http://localhost:19000"),
        ]);

        let config = load(&vars).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.template.bucket_name, "order-templates");
        assert_eq!(
            config.template.endpoint_url.as_deref(),
            Some("http://localhost:19000")
        );
        let NotificationBackend::Smtp(smtp) = config.notification.backend else {
            panic!("smtp バックエンドであること");
        };
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 2465);
    }

    #[rstest]
    #[case::user("SMTP_USER")]
    #[case::pass("SMTP_PASS")]
    #[case::sender("SMTP_SENDER")]
    fn test_smtpバックエンドで認証情報が欠けているとmissing(#[case] missing: &'static str) {
        let vars: Vec<_> = SMTP_VARS
            .into_iter()
            .filter(|(name, _)| *name != missing)
            .collect();

        let result = load(&vars);

        assert_eq!(result.unwrap_err(), ConfigError::Missing { name: missing });
    }

    #[test]
    fn test_noopバックエンドは認証情報なしで起動できる() {
        let config = load(&[("NOTIFICATION_BACKEND", "noop")]).unwrap();

        assert!(matches!(
            config.notification.backend,
            NotificationBackend::Noop
        ));
        assert_eq!(config.notification.sender, "order-notifier@localhost");
    }

    #[rstest]
    #[case::ポートが数値でない("NOTIFIER_PORT", "abc")]
    #[case::ポートが範囲外("SMTP_PORT", "70000")]
    #[case::タイムアウトが0("SMTP_TIMEOUT_SECS", "0")]
    #[case::未知のバックエンド("NOTIFICATION_BACKEND", "ses")]
    fn test_不正な値はinvalid(#[case] name: &'static str, #[case] value: &str) {
        let mut vars = SMTP_VARS.to_vec();
        vars.push((name, value));

        let result = load(&vars);

        assert!(matches!(result, Err(ConfigError::Invalid { name: n, .. }) if n == name));
    }

    #[test]
    fn test_空文字は未設定として扱う() {
        let mut vars = SMTP_VARS.to_vec();
        vars.push(("NOTIFIER_HOST", ""));

        let config = load(&vars).unwrap();

        assert_eq!(config.host, "0.0.0.0");
    }
}
