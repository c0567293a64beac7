//! HTTP handlers
//!
//! HTML pages for the single user, a JSON commit endpoint posted by the
//! analyze page, and a health probe. Every page shares the same dark shell.

pub mod auth;
pub mod gallery;
pub mod health;
pub mod home;
pub mod persons;
pub mod photos;
pub mod tagging;

use crate::source::drive::DriveClient;
use crate::{ApiError, AppState};
use axum::response::Html;

/// Escape user-entered text for interpolation into HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared HTML shell.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} · Heirloom</title>
    <style>
        * {{ margin: 0; padding: 0; box-sizing: border-box; }}
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }}
        header {{
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 16px 24px;
            margin-bottom: 24px;
        }}
        h1 {{ font-size: 24px; color: #4a9eff; }}
        h2 {{ color: #4a9eff; margin: 16px 0 8px 0; }}
        .content {{ padding: 0 24px 24px 24px; }}
        a {{ color: #4a9eff; }}
        .button {{
            display: inline-block;
            padding: 10px 20px;
            background: #4a9eff;
            color: white;
            text-decoration: none;
            border: none;
            border-radius: 4px;
            margin: 8px 6px 8px 0;
            font-weight: 600;
            font-size: 14px;
            cursor: pointer;
        }}
        .button:hover {{ background: #3a8eef; }}
        .button.danger {{ background: #ef4444; }}
        .cards {{ display: flex; flex-wrap: wrap; gap: 16px; }}
        .card {{
            border: 1px solid #3a3a3a;
            border-radius: 10px;
            padding: 12px;
            text-align: center;
            background: #242424;
            width: 190px;
        }}
        .card img {{ width: 160px; height: 160px; object-fit: cover; border-radius: 6px; }}
        .muted {{ color: #888; font-size: 13px; }}
        table {{ border-collapse: collapse; margin: 12px 0; }}
        th, td {{ border: 1px solid #3a3a3a; padding: 6px 10px; text-align: left; }}
        input, select, textarea {{
            background: #2a2a2a;
            color: #e0e0e0;
            border: 1px solid #3a3a3a;
            border-radius: 4px;
            padding: 6px;
            margin: 2px 0;
        }}
        ul {{ margin: 8px 0 8px 24px; }}
    </style>
</head>
<body>
    <header><h1>{title}</h1></header>
    <div class="content">
{body}
    </div>
</body>
</html>"#
    ))
}

/// A drive client for the stored credential, or a redirect to login.
pub async fn drive_client(state: &AppState) -> Result<DriveClient, ApiError> {
    let credentials = state.credentials.read().await;
    match credentials.as_ref() {
        Some(credentials) => Ok(DriveClient::new(state.http.clone(), credentials)),
        None => Err(ApiError::AuthRequired),
    }
}
