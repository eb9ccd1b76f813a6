//! # 通知
//!
//! 注文ライフサイクルのメール通知に関するドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`OrderNotification`] | 注文通知イベント（受注 / 発送） |
//! | [`NotificationEventType`] | 通知イベント種別 |
//! | [`RenderContext`] | テンプレート変数名から値へのマッピング |
//! | [`EmailMessage`] | レンダリング済みのメール |
//! | [`MailError`] | SMTP リレーでの送信失敗 |
//!
//! ## 設計方針
//!
//! - **enum による通知イベント**: バリアントごとにテンプレート名・件名・コンテキストが決まる
//! - **リクエストスコープ**: いずれの型もリクエスト間で共有・保持しない

use serde::Serialize;
use serde_json::{Map, Value};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::order::{Customer, Email, OrderId};

/// メール送信エラー
///
/// 送信成功は `Ok(())` で表すため、ここには失敗のみを列挙する。
/// Display はそのまま HTTP レスポンス本文として使われる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailError {
    /// SMTP 認証に失敗（送信は試みていない）
    #[error("Authentication failed")]
    AuthFailed,

    /// リレーが宛先を拒否した（リレーの応答をそのまま保持する）
    #[error("Recipient refused {0}")]
    RecipientRefused(String),

    /// 接続・TLS・タイムアウト・その他のプロトコルエラー
    #[error("SMTP transport error: {0}")]
    Transport(String),

    /// アドレスの形式不正などで MIME メッセージを組み立てられない（接続前に検出）
    #[error("invalid email message: {0}")]
    InvalidMessage(String),
}

/// 通知イベント種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEventType {
    /// 受注: 注文を受け付けたとき → 注文者に送信
    OrderReceived,
    /// 発送: 注文が発送されたとき → 注文者に送信
    OrderShipped,
}

impl NotificationEventType {
    /// バケット内のテンプレートのオブジェクトキー
    pub fn template_name(self) -> &'static str {
        match self {
            Self::OrderReceived => "order_received_template.html",
            Self::OrderShipped => "order_shipped_template.html",
        }
    }
}

/// テンプレートレンダリング用コンテキスト
///
/// 変数名 → JSON 値のマッピング。リクエストごとに構築し、1 回だけ消費する。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext(Map<String, Value>);

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 変数を追加する（同名の変数は上書き）
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// メールメッセージ
///
/// テンプレートレンダリングの出力。NotificationSender に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元メールアドレス
    pub from:      String,
    /// 送信先メールアドレス
    pub to:        String,
    /// 件名
    pub subject:   String,
    /// HTML 本文
    pub html_body: String,
}

/// 注文通知イベント
#[derive(Debug, Clone, PartialEq)]
pub enum OrderNotification {
    /// 受注通知
    Received {
        order_id: OrderId,
        customer: Customer,
        items:    Vec<Value>,
        total:    serde_json::Number,
    },
    /// 発送通知
    Shipped {
        order_id: OrderId,
        customer: Customer,
    },
}

impl OrderNotification {
    /// 通知イベント種別を返す
    pub fn event_type(&self) -> NotificationEventType {
        match self {
            Self::Received { .. } => NotificationEventType::OrderReceived,
            Self::Shipped { .. } => NotificationEventType::OrderShipped,
        }
    }

    pub fn order_id(&self) -> &OrderId {
        match self {
            Self::Received { order_id, .. } | Self::Shipped { order_id, .. } => order_id,
        }
    }

    pub fn customer(&self) -> &Customer {
        match self {
            Self::Received { customer, .. } | Self::Shipped { customer, .. } => customer,
        }
    }

    /// 受信者のメールアドレスを返す
    pub fn recipient_email(&self) -> &Email {
        &self.customer().email
    }

    /// テンプレートのオブジェクトキーを返す
    pub fn template_name(&self) -> &'static str {
        self.event_type().template_name()
    }

    /// 件名を返す
    pub fn subject(&self) -> String {
        match self {
            Self::Received { order_id, .. } => format!("ORDER: #{order_id} - Thank you!"),
            Self::Shipped { order_id, .. } => format!("Order ID #{order_id} has been shipped"),
        }
    }

    /// テンプレートに渡すコンテキストを構築する
    ///
    /// 発送通知は `customer_name` のみを渡す（既存テンプレートとの互換）。
    pub fn render_context(&self) -> RenderContext {
        let mut context = RenderContext::new();

        match self {
            Self::Received {
                order_id,
                customer,
                items,
                total,
            } => {
                context.insert("order_items", items.clone());
                context.insert("customer_name", customer.name.as_str());
                context.insert("order_id", order_id_value(order_id));
                context.insert("total_purchased", total.clone());
            }
            Self::Shipped { customer, .. } => {
                context.insert("customer_name", customer.name.as_str());
            }
        }

        context
    }
}

fn order_id_value(order_id: &OrderId) -> Value {
    match order_id {
        OrderId::Number(n) => Value::Number(n.clone()),
        OrderId::Text(s) => Value::String(s.clone()),
    }
}
