//! HTTP surface for the recommendation checker
//!
//! One handler per user action (submit-check, admin view, download,
//! clear), each a function of (shared state, request) with the page
//! render as its only output. Nothing is re-run besides the handler
//! that the action maps to.

use anyhow::Result;
use axum::{
    extract::{Form, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use colored::*;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::checker::Checker;
use crate::gate::AccessGate;
use crate::store::{InteractionRecord, InteractionStore, LogContents, Verdict};

pub struct AppState {
    pub checker: Checker,
    pub store: Arc<dyn InteractionStore>,
    pub gate: AccessGate,
}

pub type SharedState = Arc<AppState>;

// --- Request Types ---

#[derive(Debug, Deserialize)]
pub struct CheckForm {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub brand_name: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct AdminQuery {
    #[serde(default)]
    pub pw: String,
}

// --- Handler Functions ---

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "osusume",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn index() -> Html<String> {
    Html(render_check_page(None))
}

async fn submit_check(
    State(state): State<SharedState>,
    Form(form): Form<CheckForm>,
) -> Html<String> {
    if form.keyword.trim().is_empty() || form.brand_name.trim().is_empty() {
        return Html(render_check_page(Some(CheckResult::Warning(
            "キーワードと自社名を入力してください。".to_string(),
        ))));
    }

    match state.checker.run(&form.keyword, &form.brand_name).await {
        Ok(outcome) => {
            let verdict = Verdict::from_flag(outcome.recommended);
            let record =
                InteractionRecord::new(&form.keyword, &form.brand_name, verdict, &outcome.answer);
            if let Err(e) = state.store.append(&record).await {
                eprintln!("Log append failed: {}", e);
            }
            Html(render_check_page(Some(CheckResult::Verdict {
                verdict,
                answer: outcome.answer,
            })))
        }
        // API failure: inline message, no retry, nothing logged.
        Err(e) => Html(render_check_page(Some(CheckResult::Error(format!(
            "エラーが発生しました: {}",
            e
        ))))),
    }
}

async fn admin_view(State(state): State<SharedState>, Query(q): Query<AdminQuery>) -> Response {
    if !state.gate.permits(&q.pw) {
        return Html(render_password_page(!q.pw.is_empty())).into_response();
    }

    match state.store.load_all().await {
        Ok(LogContents::Records(mut records)) => {
            // Reverse-chronological; the timestamp format sorts lexicographically.
            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            Html(render_admin_page(&records, &q.pw)).into_response()
        }
        Ok(LogContents::Corrupt { reason }) => {
            Html(render_corrupt_page(&reason, &q.pw)).into_response()
        }
        Err(e) => {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(render_message_page("エラー", &format!("ログの読み込みに失敗しました: {}", e))),
            )
                .into_response()
        }
    }
}

async fn admin_clear(State(state): State<SharedState>, Query(q): Query<AdminQuery>) -> Response {
    if !state.gate.permits(&q.pw) {
        return (StatusCode::FORBIDDEN, Html(render_password_page(true))).into_response();
    }

    match state.store.clear().await {
        Ok(()) => Html(render_message_page(
            "ログを削除しました",
            &format!("すべての記録を削除しました。<a href=\"/admin?pw={}\">ログ画面へ戻る</a>", q.pw),
        ))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render_message_page("エラー", &format!("削除に失敗しました: {}", e))),
        )
            .into_response(),
    }
}

async fn admin_download(State(state): State<SharedState>, Query(q): Query<AdminQuery>) -> Response {
    if !state.gate.permits(&q.pw) {
        return (StatusCode::FORBIDDEN, Html(render_password_page(true))).into_response();
    }

    match state.store.export_csv().await {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"search_log.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(render_message_page("エラー", &format!("ダウンロードに失敗しました: {}", e))),
        )
            .into_response(),
    }
}

// --- Page Rendering ---

pub enum CheckResult {
    Verdict { verdict: Verdict, answer: String },
    Warning(String),
    Error(String),
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ja">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 720px; margin: 2rem auto; padding: 0 1rem; color: #222; }}
input[type=text], input[type=password] {{ width: 100%; padding: 0.5rem; box-sizing: border-box; }}
button {{ padding: 0.5rem 1.5rem; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.4rem; text-align: left; }}
.ok {{ color: #1a7f37; }} .ng {{ color: #b42318; }} .warn {{ color: #9a6700; }} .err {{ color: #b42318; }}
.answer {{ background: #f6f8fa; padding: 1rem; white-space: pre-wrap; }}
footer {{ margin-top: 3rem; font-size: 0.8rem; }} footer a {{ color: #bbb; text-decoration: none; }}
</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

fn render_check_page(result: Option<CheckResult>) -> String {
    let result_html = match result {
        None => String::new(),
        Some(CheckResult::Verdict { verdict, answer }) => {
            let (class, label) = match verdict {
                Verdict::Recommended => ("ok", "〇 推奨されています"),
                Verdict::NotRecommended => ("ng", "× 推奨されていません"),
            };
            format!(
                "<p class=\"ok\">分析完了！</p><h3 class=\"{}\">{}</h3><h3>🔍 分析結果</h3><div class=\"answer\">{}</div>",
                class,
                label,
                escape_html(&answer)
            )
        }
        Some(CheckResult::Warning(msg)) => format!("<p class=\"warn\">{}</p>", escape_html(&msg)),
        Some(CheckResult::Error(msg)) => format!("<p class=\"err\">{}</p>", escape_html(&msg)),
    };

    let body = format!(
        r#"<h1>🤖 AI検索・推奨チェッカー</h1>
<p>ChatGPTなどのAI検索で、<strong>あなたのサービスが「おすすめ」として紹介されているか</strong>を確認します。</p>
<form method="post" action="/check">
  <p><label>狙っているキーワード<br><input type="text" name="keyword" placeholder="例：渋谷 居酒屋 デート、会計ソフト おすすめ"></label></p>
  <p><label>確認したい自社名<br><input type="text" name="brand_name" placeholder="例：〇〇ダイニング、freee"></label></p>
  <button type="submit">チェック開始</button>
</form>
{result_html}
<footer><a href="/admin">管理</a></footer>"#
    );
    page("AI検索・推奨チェッカー", &body)
}

fn render_password_page(rejected: bool) -> String {
    let notice = if rejected {
        "<p class=\"err\">パスワードが違います。</p>"
    } else {
        ""
    };
    let body = format!(
        r#"<h1>🔒 管理画面</h1>
{notice}
<form method="get" action="/admin">
  <p><label>パスワード<br><input type="password" name="pw"></label></p>
  <button type="submit">表示</button>
</form>
<footer><a href="/">チェック画面へ戻る</a></footer>"#
    );
    page("管理画面", &body)
}

fn render_admin_page(records: &[InteractionRecord], pw: &str) -> String {
    let total = records.len();
    let recommended = records
        .iter()
        .filter(|r| r.verdict == Verdict::Recommended)
        .count();

    let rows: String = records
        .iter()
        .map(|r| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&r.timestamp),
                escape_html(&r.keyword),
                escape_html(&r.brand_name),
                r.verdict.symbol(),
                escape_html(&r.answer_excerpt)
            )
        })
        .collect();

    let pw = escape_html(pw);
    let body = format!(
        r#"<h1>📋 チェック履歴</h1>
<p>合計: {total} 件 ／ 推奨: {recommended} 件 ／ 非推奨: {not_recommended} 件</p>
<p>
  <a href="/admin/download?pw={pw}">📥 CSVダウンロード</a>
</p>
<table>
  <tr><th>日時</th><th>キーワード</th><th>自社名</th><th>判定</th><th>回答抜粋</th></tr>
  {rows}
</table>
<form method="post" action="/admin/clear?pw={pw}" onsubmit="return confirm('本当にすべての記録を削除しますか？');">
  <p><button type="submit">🗑 ログを全削除</button></p>
</form>
<footer><a href="/">チェック画面へ戻る</a></footer>"#,
        not_recommended = total - recommended,
    );
    page("チェック履歴", &body)
}

fn render_corrupt_page(reason: &str, pw: &str) -> String {
    let body = format!(
        r#"<h1>⚠️ ログファイルが壊れています</h1>
<p class="err">{}</p>
<p>ログを初期化すると新しいファイルが作り直されます。この操作は元に戻せません。</p>
<form method="post" action="/admin/clear?pw={}">
  <p><button type="submit">🗑 ログを初期化する</button></p>
</form>
<footer><a href="/">チェック画面へ戻る</a></footer>"#,
        escape_html(reason),
        escape_html(pw),
    );
    page("ログ破損", &body)
}

fn render_message_page(title: &str, body_html: &str) -> String {
    page(title, &format!("<h1>{}</h1><p>{}</p>", title, body_html))
}

// --- Router / Server ---

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/check", post(submit_check))
        .route("/admin", get(admin_view))
        .route("/admin/clear", post(admin_clear))
        .route("/admin/download", get(admin_download))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(state: SharedState, bind_addr: &str) -> Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    println!("🌐 Listening on {}", format!("http://{}", bind_addr).cyan());

    axum::serve(listener, app).await?;
    Ok(())
}
