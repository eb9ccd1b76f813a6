//! # 注文
//!
//! 通知イベントに含まれる注文・顧客の値オブジェクトを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 |
//! |---|------------|
//! | [`OrderId`] | 注文 ID（JSON の数値または文字列） |
//! | [`Email`] | 顧客のメールアドレス |
//! | [`Customer`] | 注文者（名前 + メールアドレス） |

use std::fmt;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// 注文 ID（値オブジェクト）
///
/// 上流の注文サービスは数値・文字列のどちらでも ID を送ってくるため、
/// 受け取った JSON の型を保ったまま保持する。
///
/// 表示時は引用符を付けない（`1`、`ORD-42`）。件名とテンプレートの両方で
/// 同じ表記になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderId {
    /// 数値 ID
    Number(serde_json::Number),
    /// 文字列 ID
    Text(String),
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// メールアドレス（値オブジェクト）
///
/// 生成時にバリデーションを実行し、不正な宛先で SMTP まで到達するのを防ぐ。
/// ここで受け付けたアドレスは送信時のメッセージ構築でも必ず受け付けられる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// メールアドレスを作成する
    ///
    /// # バリデーション
    ///
    /// - 空文字列ではない
    /// - 表示名などを含まない `local@domain` 単体のアドレス
    ///   （送信時と同じ lettre のパーサーで検証する）
    /// - 最大 255 文字
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::Validation(
                "order_customer.email must not be empty".to_string(),
            ));
        }

        if trimmed.len() > 255 {
            return Err(DomainError::Validation(
                "order_customer.email must be at most 255 characters".to_string(),
            ));
        }

        let is_bare_address = trimmed
            .parse::<Mailbox>()
            .is_ok_and(|mailbox| mailbox.name.is_none() && mailbox.email.to_string() == trimmed);
        if !is_bare_address {
            return Err(DomainError::Validation(format!(
                "order_customer.email is not a valid address: {trimmed}"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// 文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 注文者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub name:  String,
    pub email: Email,
}

impl Customer {
    pub fn new(name: impl Into<String>, email: Email) -> Self {
        Self {
            name: name.into(),
            email,
        }
    }
}
