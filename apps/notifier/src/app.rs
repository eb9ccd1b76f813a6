//! # アプリケーション構築
//!
//! ルーターとミドルウェアの組み立てを担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use order_notifier_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::handler::{NotifyState, health_check, order_received, order_shipped};

/// ルーターを構築する
///
/// 発送通知のパスは末尾スラッシュ付き（既存の送信元との互換）。
pub fn build_app(notify_state: Arc<NotifyState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/notify/order-received", post(order_received))
        .route("/notify/order-shipped/", post(order_shipped))
        .with_state(notify_state)
        // レイヤー順序: 下に書いたものが外側
        // 1. SetRequestIdLayer（最外）: UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: スパンに request_id を含め、全ログに自動注入
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        // 4. CanonicalLogLineLayer: リクエスト完了サマリ
        .layer(CanonicalLogLineLayer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
