//! # Order Notifier ライブラリ
//!
//! 注文イベントを受けて注文者にメールを送信する HTTP サービスのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app`: ルーター構築（ルートとミドルウェアの組み立て）
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラーと HTTP レスポンスへの変換
//! - `handler`: HTTP ハンドラ
//! - `usecase`: テンプレート取得 → レンダリング → 送信

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
