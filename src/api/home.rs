//! Home menu

use super::page;
use crate::AppState;
use axum::{response::IntoResponse, routing::get, Router};

/// GET /
pub async fn home_page() -> impl IntoResponse {
    page(
        "Family Photo Archive",
        r#"
    <p>Organize drive photos, tag the faces in them, and browse the family gallery.</p>
    <p>
        <a href="/photos" class="button">Drive Photos</a>
        <a href="/persons" class="button">Family Members</a>
        <a href="/gallery" class="button">Face Gallery</a>
    </p>
"#,
    )
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(home_page))
}
