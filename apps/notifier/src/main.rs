//! # Order Notifier サーバー
//!
//! 注文イベント（受注・発送）を受け取り、S3 のテンプレートからメールを組み立てて
//! SMTP リレー経由で注文者に送信する HTTP サービス。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFIER_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `NOTIFIER_PORT` | No | ポート番号（デフォルト: `5000`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp`（デフォルト）または `noop` |
//! | `SMTP_USER` / `SMTP_PASS` | smtp 時 | SMTP 認証情報 |
//! | `SMTP_SENDER` | smtp 時 | 送信元メールアドレス |
//! | `SMTP_HOST` / `SMTP_PORT` | No | リレー（デフォルト: `email-smtp.us-east-2.amazonaws.com:465`） |
//! | `SMTP_TIMEOUT_SECS` | No | 接続・各コマンドの上限（デフォルト: 30） |
//! | `TEMPLATE_BUCKET_NAME` | No | テンプレートのバケット（デフォルト: `py-notifier`） |
//! | `TEMPLATE_FETCH_TIMEOUT_SECS` | No | テンプレート取得の上限（デフォルト: 10） |
//! | `S3_ENDPOINT_URL` | No | MinIO 等のエンドポイント |
//! | `LOG_FORMAT` | No | `json` または `pretty`（デフォルト） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（メールは送信せずログ出力のみ）
//! NOTIFICATION_BACKEND=noop S3_ENDPOINT_URL=http://localhost:19000 cargo run -p order-notifier
//!
//! # 本番環境
//! SMTP_USER=... SMTP_PASS=... SMTP_SENDER=orders@example.com cargo run -p order-notifier --release
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use order_notifier::{
    app::build_app,
    config::{NotificationBackend, NotifierConfig},
    handler::NotifyState,
    usecase::{NotificationService, notification::TemplateRenderer},
};
use order_notifier_infra::{
    notification::{
        NoopNotificationSender,
        NotificationSender,
        SmtpNotificationSender,
        TlsRelayConnector,
        validate_sender_address,
    },
    template_store::{self, S3TemplateStore},
};
use order_notifier_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("notifier"));
    let _tracing_guard = tracing::info_span!("app", service = "notifier").entered();

    let config = NotifierConfig::from_env().context("設定の読み込みに失敗しました")?;
    tracing::info!(
        "Notifier サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    // テンプレートストア
    let s3_client = template_store::create_client(
        config.template.endpoint_url.as_deref(),
        config.template.fetch_timeout,
    )
    .await;
    let store = S3TemplateStore::new(s3_client, config.template.bucket_name.clone());
    tracing::info!(bucket = %store.bucket_name(), "テンプレートストアを初期化しました");

    // メール送信
    validate_sender_address(&config.notification.sender)?;
    let sender: Arc<dyn NotificationSender> = match &config.notification.backend {
        NotificationBackend::Smtp(smtp) => {
            let connector = TlsRelayConnector::new(&smtp.host, smtp.port, smtp.timeout)?;
            tracing::info!(host = %smtp.host, port = smtp.port, "通知バックエンド: SMTP");
            Arc::new(SmtpNotificationSender::new(
                Arc::new(connector),
                smtp.credentials.clone(),
                smtp.timeout,
            ))
        }
        NotificationBackend::Noop => {
            tracing::info!("通知バックエンド: Noop（メールは送信されません）");
            Arc::new(NoopNotificationSender)
        }
    };

    let service = NotificationService::new(
        Arc::new(store),
        TemplateRenderer::new(),
        sender,
        config.notification.sender.clone(),
    );
    let app = build_app(Arc::new(NotifyState { service }));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("アドレスのパースに失敗しました: {}:{}", config.host, config.port))?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Notifier サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Ctrl+C / SIGTERM を待つ
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl+C ハンドラの登録に失敗");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM ハンドラの登録に失敗");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("シャットダウンを開始します");
}
