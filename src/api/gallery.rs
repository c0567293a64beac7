//! Gallery of confirmed face tags

use super::{escape_html, page};
use crate::db;
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};
use uuid::Uuid;

/// GET /gallery
pub async fn gallery_page(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let crops = db::face_tags::list_tagged_crops(&state.db).await?;

    let mut cards = String::new();
    for crop in &crops {
        let name = crop
            .person_name
            .as_deref()
            .map(escape_html)
            .unwrap_or_else(|| "Unidentified".to_string());
        cards.push_str(&format!(
            r#"        <div class="card">
            <img src="/media/{path}" alt="{name}">
            <h2>{name}</h2>
            <span class="muted">source: {source}</span>
            <br><br>
            <a href="/gallery/{id}/delete" class="button danger">Delete</a>
        </div>
"#,
            path = crop.tag.crop_path,
            source = escape_html(&crop.tag.source_file_id),
            id = crop.tag.id,
        ));
    }

    let body = if crops.is_empty() {
        r#"
    <p>No tagged faces yet. Analyze a photo to get started.</p>
    <p><a href="/photos" class="button">Drive Photos</a> <a href="/">Back to menu</a></p>
"#
        .to_string()
    } else {
        format!(
            r#"
    <div class="cards">
{cards}    </div>
    <p><a href="/">Back to menu</a></p>
"#
        )
    };

    Ok(page("Face Gallery", &body))
}

/// GET /gallery/:id/delete
///
/// Best-effort on the filesystem side: a missing backing file does not stop
/// the record deletion.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    state.workflow.delete_tag(id).await?;
    Ok(Redirect::to("/gallery"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/gallery", get(gallery_page))
        .route("/gallery/:id/delete", get(delete_tag))
}
