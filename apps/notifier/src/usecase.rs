//! # ユースケース層
//!
//! ハンドラから呼ばれるアプリケーションロジックを定義する。
//!
//! - [`notification`] - テンプレート取得 → レンダリング → メール送信

pub mod notification;

pub use notification::NotificationService;
