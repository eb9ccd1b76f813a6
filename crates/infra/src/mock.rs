//! # テスト用モック
//!
//! ユースケース・ハンドラテストで使用するインメモリモック。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! order-notifier-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use order_notifier_domain::notification::{EmailMessage, MailError};

use crate::{
    notification::NotificationSender,
    template_store::{TemplateStore, TemplateStoreError},
};

// ===== MockTemplateStore =====

/// インメモリのテンプレートストア
///
/// 登録されていないテンプレートは `KeyMissing` になる。
#[derive(Clone)]
pub struct MockTemplateStore {
    bucket_name: String,
    templates:   Arc<Mutex<HashMap<String, String>>>,
    failure:     Arc<Mutex<Option<TemplateStoreError>>>,
    fetched:     Arc<Mutex<Vec<String>>>,
}

impl MockTemplateStore {
    pub fn new(bucket_name: impl Into<String>) -> Self {
        Self {
            bucket_name: bucket_name.into(),
            templates:   Arc::new(Mutex::new(HashMap::new())),
            failure:     Arc::new(Mutex::new(None)),
            fetched:     Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn add_template(&self, name: impl Into<String>, content: impl Into<String>) {
        self.templates
            .lock()
            .unwrap()
            .insert(name.into(), content.into());
    }

    /// 以降のすべての取得を指定したエラーで失敗させる
    pub fn fail_with(&self, error: TemplateStoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// 取得を試みたテンプレート名（呼び出し順）
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl TemplateStore for MockTemplateStore {
    async fn fetch(&self, template_name: &str) -> Result<String, TemplateStoreError> {
        self.fetched.lock().unwrap().push(template_name.to_string());

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }

        self.templates
            .lock()
            .unwrap()
            .get(template_name)
            .cloned()
            .ok_or_else(|| TemplateStoreError::KeyMissing {
                bucket: self.bucket_name.clone(),
                key:    template_name.to_string(),
            })
    }
}

// ===== MockNotificationSender =====

/// 送信内容を記録するメール送信モック
///
/// `fail_with` を設定しない限り常に成功する。
#[derive(Clone, Default)]
pub struct MockNotificationSender {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failure: Arc<Mutex<Option<MailError>>>,
}

impl MockNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降のすべての送信を指定したエラーで失敗させる
    pub fn fail_with(&self, error: MailError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// 送信に成功したメール
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for MockNotificationSender {
    async fn send_email(&self, email: &EmailMessage) -> Result<(), MailError> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}
