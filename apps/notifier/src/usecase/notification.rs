//! # 通知ユースケース
//!
//! 注文イベントに伴うメール通知の生成・送信を統合する。
//!
//! ## モジュール構成
//!
//! - [`template_renderer`] - minijinja によるテンプレートのレンダリング
//! - [`service`] - テンプレート取得 + レンダリング + 送信の統合サービス

pub mod service;
pub mod template_renderer;

pub use service::NotificationService;
pub use template_renderer::{RenderError, TemplateRenderer};
