//! # テンプレートレンダラー
//!
//! S3 から取得したテンプレート本文を minijinja でレンダリングする。
//!
//! ## 設計方針
//!
//! - **Jinja2 互換**: `{{ order_id }}` / `{% for item in order_items %}` をそのまま使える
//! - **未定義変数は空文字**: minijinja のデフォルト（lenient）のまま。エラーにしない
//! - **自動エスケープなし**: テンプレートは HTML としてそのまま出力する
//! - **純粋関数**: I/O を行わず、同じ入力には同じ出力を返す

use minijinja::{AutoEscape, Environment};
use order_notifier_domain::notification::RenderContext;
use thiserror::Error;

/// テンプレートのレンダリングエラー（構文エラーなど）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template render error: {0}")]
pub struct RenderError(pub String);

/// テンプレートレンダラー
///
/// テンプレートはリクエストごとに取得するため、環境には登録せず
/// [`Environment::render_str`] で都度コンパイルする。
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::None);
        Self { env }
    }

    /// テンプレート本文をコンテキストでレンダリングする
    pub fn render(&self, raw_content: &str, context: &RenderContext) -> Result<String, RenderError> {
        self.env
            .render_str(raw_content, context)
            .map_err(|e| RenderError(e.to_string()))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}
