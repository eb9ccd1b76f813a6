//! # 通知サービス
//!
//! テンプレート取得 → レンダリング → メール送信を統合するサービス。
//!
//! ## 設計方針
//!
//! - **結果を返す**: 送信結果はそのまま HTTP レスポンスになるため、失敗はエラーとして返す
//! - **リトライしない**: どの段階も 1 回だけ試みる
//! - **依存性注入**: `TemplateStore` と `NotificationSender` は trait で抽象化

use std::sync::Arc;

use order_notifier_domain::notification::{EmailMessage, OrderNotification};
use order_notifier_infra::{notification::NotificationSender, template_store::TemplateStore};
use order_notifier_shared::{event_log::event, log_business_event};

use super::TemplateRenderer;
use crate::error::NotifierError;

/// 通知サービス
///
/// 起動時に 1 度だけ構築し、全リクエストで共有する（内部状態は持たない）。
pub struct NotificationService {
    store:          Arc<dyn TemplateStore>,
    renderer:       TemplateRenderer,
    sender:         Arc<dyn NotificationSender>,
    sender_address: String,
}

impl NotificationService {
    /// # 引数
    ///
    /// - `store`: テンプレートの取得元
    /// - `renderer`: テンプレートレンダラー
    /// - `sender`: メール送信
    /// - `sender_address`: 送信元メールアドレス
    pub fn new(
        store: Arc<dyn TemplateStore>,
        renderer: TemplateRenderer,
        sender: Arc<dyn NotificationSender>,
        sender_address: String,
    ) -> Self {
        Self {
            store,
            renderer,
            sender,
            sender_address,
        }
    }

    /// 通知メールを送信する
    ///
    /// 送信結果（成功・失敗）はビジネスイベントとしてログに出力する。
    #[tracing::instrument(
        skip_all,
        fields(
            notification.event_type = %notification.event_type(),
            order_id = %notification.order_id(),
        )
    )]
    pub async fn notify(&self, notification: &OrderNotification) -> Result<(), NotifierError> {
        let event_type: &'static str = notification.event_type().into();
        let order_id = notification.order_id().to_string();

        match self.deliver(notification).await {
            Ok(()) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::ORDER,
                    event.entity_id = %order_id,
                    event.result = event::result::SUCCESS,
                    notification.event_type = event_type,
                    notification.recipient = %notification.recipient_email(),
                    "通知メール送信成功"
                );
                Ok(())
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::ORDER,
                    event.entity_id = %order_id,
                    event.result = event::result::FAILURE,
                    notification.event_type = event_type,
                    notification.recipient = %notification.recipient_email(),
                    error = %e,
                    "通知メール送信失敗"
                );
                Err(e)
            }
        }
    }

    async fn deliver(&self, notification: &OrderNotification) -> Result<(), NotifierError> {
        let raw_template = self.store.fetch(notification.template_name()).await?;

        let html_body = self
            .renderer
            .render(&raw_template, &notification.render_context())?;

        let email = EmailMessage {
            from: self.sender_address.clone(),
            to: notification.recipient_email().to_string(),
            subject: notification.subject(),
            html_body,
        };

        self.sender.send_email(&email).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use order_notifier_domain::{
        notification::MailError,
        order::{Customer, Email, OrderId},
    };
    use order_notifier_infra::{
        mock::{MockNotificationSender, MockTemplateStore},
        template_store::TemplateStoreError,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    const SENDER: &str = "orders@example.com";

    fn make_service(store: MockTemplateStore, sender: MockNotificationSender) -> NotificationService {
        NotificationService::new(
            Arc::new(store),
            TemplateRenderer::new(),
            Arc::new(sender),
            SENDER.to_string(),
        )
    }

    fn make_customer() -> Customer {
        Customer::new("A", Email::new("a@b.com").unwrap())
    }

    fn make_received() -> OrderNotification {
        OrderNotification::Received {
            order_id: OrderId::from(1),
            customer: make_customer(),
            items:    vec![json!({"name": "Pen"})],
            total:    serde_json::Number::from(12),
        }
    }

    fn make_shipped() -> OrderNotification {
        OrderNotification::Shipped {
            order_id: OrderId::from("ORD-7"),
            customer: make_customer(),
        }
    }

    #[tokio::test]
    async fn test_受注通知はレンダリング結果をそのまま本文にして送信する() {
        let store = MockTemplateStore::new("py-notifier");
        store.add_template(
            "order_received_template.html",
            "Hello {{customer_name}}, order {{order_id}}",
        );
        let sender = MockNotificationSender::new();
        let sut = make_service(store.clone(), sender.clone());

        sut.notify(&make_received()).await.unwrap();

        assert_eq!(store.fetched(), vec!["order_received_template.html"]);
        let sent = sender.sent_emails();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            EmailMessage {
                from:      SENDER.to_string(),
                to:        "a@b.com".to_string(),
                subject:   "ORDER: #1 - Thank you!".to_string(),
                html_body: "Hello A, order 1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_発送通知はcustomer_nameのみをテンプレートに渡す() {
        let store = MockTemplateStore::new("py-notifier");
        store.add_template(
            "order_shipped_template.html",
            "Hi {{ customer_name }}, order [{{ order_id }}] shipped",
        );
        let sender = MockNotificationSender::new();
        let sut = make_service(store, sender.clone());

        sut.notify(&make_shipped()).await.unwrap();

        let sent = sender.sent_emails();
        assert_eq!(sent[0].subject, "Order ID #ORD-7 has been shipped");
        assert_eq!(sent[0].html_body, "Hi A, order [] shipped");
    }

    #[tokio::test]
    async fn test_テンプレートがない場合は送信しない() {
        let store = MockTemplateStore::new("py-notifier");
        let sender = MockNotificationSender::new();
        let sut = make_service(store, sender.clone());

        let result = sut.notify(&make_received()).await;

        assert!(matches!(
            result,
            Err(NotifierError::TemplateStore(TemplateStoreError::KeyMissing { ref key, .. }))
                if key == "order_received_template.html"
        ));
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn test_構文エラーのテンプレートはrender_errorになり送信しない() {
        let store = MockTemplateStore::new("py-notifier");
        store.add_template("order_received_template.html", "{% if %}");
        let sender = MockNotificationSender::new();
        let sut = make_service(store, sender.clone());

        let result = sut.notify(&make_received()).await;

        assert!(matches!(result, Err(NotifierError::Render(_))));
        assert!(sender.sent_emails().is_empty());
    }

    #[tokio::test]
    async fn test_送信失敗はmail_errorとして返す() {
        let store = MockTemplateStore::new("py-notifier");
        store.add_template("order_received_template.html", "body");
        let sender = MockNotificationSender::new();
        sender.fail_with(MailError::AuthFailed);
        let sut = make_service(store, sender);

        let result = sut.notify(&make_received()).await;

        assert!(matches!(result, Err(NotifierError::Mail(MailError::AuthFailed))));
    }
}
