//! # 通知ハンドラ
//!
//! 注文イベントを受け取り、注文者にメールを送信する。
//!
//! ## エンドポイント
//!
//! - `POST /notify/order-received` - 受注通知
//! - `POST /notify/order-shipped/` - 発送通知
//!
//! 成功時は `200 Email Sent`（text/plain）。失敗時のレスポンスは
//! [`NotifierError`] を参照。

use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse};
use order_notifier_domain::{
    DomainError,
    notification::OrderNotification,
    order::{Customer, Email, OrderId},
};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{error::NotifierError, usecase::NotificationService};

/// 送信成功時のレスポンス本文
pub const EMAIL_SENT: &str = "Email Sent";

/// 通知 API の共有状態
pub struct NotifyState {
    pub service: NotificationService,
}

// --- リクエスト型 ---

/// 注文者
#[derive(Debug, Deserialize)]
pub struct OrderCustomerDto {
    pub name:  String,
    pub email: String,
}

impl TryFrom<OrderCustomerDto> for Customer {
    type Error = DomainError;

    fn try_from(dto: OrderCustomerDto) -> Result<Self, Self::Error> {
        Ok(Customer::new(dto.name, Email::new(dto.email)?))
    }
}

/// 受注通知リクエスト
///
/// 未知のフィールドは無視する（注文イベント全体がそのまま送られてくる）。
#[derive(Debug, Deserialize)]
pub struct OrderReceivedRequest {
    pub id:             OrderId,
    pub order_customer: OrderCustomerDto,
    pub items:          Vec<Value>,
    pub total:          serde_json::Number,
}

impl TryFrom<OrderReceivedRequest> for OrderNotification {
    type Error = DomainError;

    fn try_from(request: OrderReceivedRequest) -> Result<Self, Self::Error> {
        Ok(OrderNotification::Received {
            order_id: request.id,
            customer: request.order_customer.try_into()?,
            items:    request.items,
            total:    request.total,
        })
    }
}

/// 発送通知リクエスト
#[derive(Debug, Deserialize)]
pub struct OrderShippedRequest {
    pub id:             OrderId,
    pub order_customer: OrderCustomerDto,
}

impl TryFrom<OrderShippedRequest> for OrderNotification {
    type Error = DomainError;

    fn try_from(request: OrderShippedRequest) -> Result<Self, Self::Error> {
        Ok(OrderNotification::Shipped {
            order_id: request.id,
            customer: request.order_customer.try_into()?,
        })
    }
}

// --- ハンドラ ---

/// POST /notify/order-received
///
/// 受注確認メールを注文者に送信する。
pub async fn order_received(
    State(state): State<Arc<NotifyState>>,
    body: Bytes,
) -> Result<impl IntoResponse, NotifierError> {
    let request: OrderReceivedRequest = parse_body(&body)?;
    let notification = OrderNotification::try_from(request)?;

    state.service.notify(&notification).await?;

    Ok((StatusCode::OK, EMAIL_SENT))
}

/// POST /notify/order-shipped/
///
/// 発送通知メールを注文者に送信する。
pub async fn order_shipped(
    State(state): State<Arc<NotifyState>>,
    body: Bytes,
) -> Result<impl IntoResponse, NotifierError> {
    let request: OrderShippedRequest = parse_body(&body)?;
    let notification = OrderNotification::try_from(request)?;

    state.service.notify(&notification).await?;

    Ok((StatusCode::OK, EMAIL_SENT))
}

/// リクエスト本文を JSON としてパースする
///
/// axum の `Json` 抽出器は 415 / 422 を返すため使わず、
/// 形式不正・必須フィールド欠落をすべて 400 にそろえる。
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, DomainError> {
    serde_json::from_slice(body)
        .map_err(|e| DomainError::Validation(format!("Invalid request body: {e}")))
}
