//! Analyze and commit routes
//!
//! The analyze page offers each detected crop with a person selector; its
//! script collects the picks into a JSON body for the commit endpoint, so
//! the mapping travels as structured data rather than form field names.

use super::{drive_client, escape_html, page};
use crate::tagging::{CommitOutcome, FacePick};
use crate::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

/// GET /photos/:file_id/analyze
pub async fn analyze_photo(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let client = drive_client(&state).await?;

    let outcome = state
        .workflow
        .analyze(&client, &state.detector, &file_id)
        .await?;

    if outcome.crops.is_empty() {
        let body = r#"
    <p>No faces were detected in this photo.</p>
    <p><a href="/photos">Back to photos</a></p>
"#;
        return Ok(page("Analysis Results", body));
    }

    let mut options = String::new();
    for person in &outcome.persons {
        options.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            person.id,
            escape_html(&person.display_name())
        ));
    }

    let mut cards = String::new();
    for crop in &outcome.crops {
        cards.push_str(&format!(
            r#"        <div class="card">
            <img src="/media/{path}" alt="face {index}">
            <br><label>Who is this?</label><br>
            <select data-index="{index}" class="pick">
                <option value="">--- Select ---</option>
                {options}
            </select>
        </div>
"#,
            path = crop.media_path,
            index = crop.index,
        ));
    }

    let body = format!(
        r#"
    <p>{count} face(s) detected. Choose who each one is, then save.</p>
    <div class="cards">
{cards}    </div>
    <p>
        <button class="button" onclick="commitPicks()">Save selections</button>
        <a href="/photos">Back without saving</a>
    </p>
    <p id="commit-error" class="muted"></p>
    <script>
        async function commitPicks() {{
            const picks = Array.from(document.querySelectorAll('select.pick')).map(el => ({{
                index: Number(el.dataset.index),
                person_id: el.value || null,
            }}));
            const response = await fetch('/api/tags/commit', {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ token: '{token}', picks }}),
            }});
            if (response.ok) {{
                window.location = '/gallery';
            }} else {{
                document.getElementById('commit-error').textContent =
                    'Save failed: ' + await response.text();
            }}
        }}
    </script>
"#,
        count = outcome.crops.len(),
        token = outcome.token,
    );

    Ok(page("Analysis Results", &body))
}

#[derive(Debug, Deserialize)]
pub struct CommitRequest {
    pub token: Uuid,
    pub picks: Vec<FacePick>,
}

/// POST /api/tags/commit
pub async fn commit_tags(
    State(state): State<AppState>,
    Json(request): Json<CommitRequest>,
) -> ApiResult<Json<CommitOutcome>> {
    let outcome = state
        .workflow
        .commit(request.token, &request.picks)
        .await?;

    tracing::info!(
        created = outcome.created,
        skipped = outcome.skipped,
        "tag commit complete"
    );
    Ok(Json(outcome))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/photos/:file_id/analyze", get(analyze_photo))
        .route("/api/tags/commit", post(commit_tags))
}
