//! Drive photo listing and the one-time organize pass

use super::{drive_client, escape_html, page};
use crate::source::PhotoSource;
use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    response::{IntoResponse, Redirect},
    routing::get,
    Router,
};

/// GET /photos
///
/// Recursive listing of the well-known drive folder; each entry links to its
/// analysis page. Without the folder, offers the organize pass instead.
pub async fn list_photos(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let client = drive_client(&state).await?;
    let folder_name = &state.config.drive_folder_name;

    let body = match client.find_folder(folder_name).await? {
        Some(folder_id) => {
            let images = client.list_images(&folder_id).await?;
            tracing::info!(count = images.len(), "drive scan complete");

            let mut items = String::new();
            for image in &images {
                items.push_str(&format!(
                    "        <li><a href=\"/photos/{}/analyze\">{}</a></li>\n",
                    image.id,
                    escape_html(&image.name)
                ));
            }
            format!(
                r#"
    <p>Scan complete: {} photos found across all sub-folders of <b>{}</b>.</p>
    <ul>
{items}    </ul>
    <p><a href="/">Back to menu</a></p>
"#,
                images.len(),
                escape_html(folder_name)
            )
        }
        None => format!(
            r#"
    <p>No <b>{}</b> folder found in your drive yet.</p>
    <p><a href="/drive/organize" class="button">Organize Drive Now</a></p>
    <p><a href="/">Back to menu</a></p>
"#,
            escape_html(folder_name)
        ),
    };

    Ok(page("Drive Photos", &body))
}

/// GET /drive/organize
///
/// Find or create the well-known folder and sweep loose top-level images
/// into it, then land on the photo list.
pub async fn organize(State(state): State<AppState>) -> ApiResult<Redirect> {
    let client = drive_client(&state).await?;
    client
        .ensure_organized(&state.config.drive_folder_name)
        .await?;
    Ok(Redirect::to("/photos"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/photos", get(list_photos))
        .route("/drive/organize", get(organize))
}
