//! Person registry administration
//!
//! The administrative channel for family members: list, create, edit,
//! delete. Deleting a person cascades to their face tags in the database.

use super::{escape_html, page};
use crate::db;
use crate::models::{Kinship, Person};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

/// Shared form shape for create and update. Empty strings mean "not set".
#[derive(Debug, Deserialize)]
pub struct PersonForm {
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub kinship: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub recognition_tag: String,
}

fn blank_to_none(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl PersonForm {
    /// Apply the form onto a person record, validating the typed fields.
    fn apply(self, person: &mut Person) -> Result<(), ApiError> {
        let given_name = self.given_name.trim();
        if given_name.is_empty() {
            return Err(ApiError::BadRequest("given name is required".to_string()));
        }
        person.given_name = given_name.to_string();
        person.family_name = blank_to_none(self.family_name);

        person.kinship = match blank_to_none(self.kinship) {
            Some(value) => Some(
                value
                    .parse::<Kinship>()
                    .map_err(ApiError::BadRequest)?,
            ),
            None => None,
        };

        person.birth_date = match blank_to_none(self.birth_date) {
            Some(value) => Some(
                NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_err(|_| {
                    ApiError::BadRequest(format!("birth date must be YYYY-MM-DD, got {value}"))
                })?,
            ),
            None => None,
        };

        person.biography = self.biography.trim().to_string();
        person.recognition_tag = blank_to_none(self.recognition_tag);
        Ok(())
    }
}

fn kinship_options(selected: Option<Kinship>) -> String {
    let mut options = "<option value=\"\">---</option>".to_string();
    for kinship in Kinship::all() {
        let marker = if selected == Some(kinship) { " selected" } else { "" };
        options.push_str(&format!(
            "<option value=\"{0}\"{marker}>{0}</option>",
            kinship.as_str()
        ));
    }
    options
}

fn person_form_fields(person: Option<&Person>) -> String {
    let given = person.map(|p| escape_html(&p.given_name)).unwrap_or_default();
    let family = person
        .and_then(|p| p.family_name.as_deref())
        .map(escape_html)
        .unwrap_or_default();
    let birth = person
        .and_then(|p| p.birth_date)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let biography = person.map(|p| escape_html(&p.biography)).unwrap_or_default();
    let tag = person
        .and_then(|p| p.recognition_tag.as_deref())
        .map(escape_html)
        .unwrap_or_default();

    format!(
        r#"        <label>Given name</label><br>
        <input name="given_name" value="{given}" required><br>
        <label>Family name</label><br>
        <input name="family_name" value="{family}"><br>
        <label>Kinship</label><br>
        <select name="kinship">{kinship}</select><br>
        <label>Birth date (YYYY-MM-DD)</label><br>
        <input name="birth_date" value="{birth}"><br>
        <label>Biography</label><br>
        <textarea name="biography" rows="3" cols="40">{biography}</textarea><br>
        <label>Recognition tag</label><br>
        <input name="recognition_tag" value="{tag}"><br>
"#,
        kinship = kinship_options(person.and_then(|p| p.kinship)),
    )
}

/// GET /persons
pub async fn list_page(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let persons = db::persons::list_persons(&state.db).await?;

    let mut rows = String::new();
    for person in &persons {
        rows.push_str(&format!(
            r#"        <tr>
            <td>{name}</td>
            <td>{kinship}</td>
            <td>{birth}</td>
            <td>
                <a href="/persons/{id}/edit">edit</a>
                <form method="post" action="/persons/{id}/delete" style="display:inline">
                    <button class="button danger" type="submit">delete</button>
                </form>
            </td>
        </tr>
"#,
            name = escape_html(&person.display_name()),
            kinship = person
                .kinship
                .map(|k| k.as_str().to_string())
                .unwrap_or_default(),
            birth = person
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            id = person.id,
        ));
    }

    let body = format!(
        r#"
    <h2>Registered family members</h2>
    <table>
        <tr><th>Name</th><th>Kinship</th><th>Born</th><th></th></tr>
{rows}    </table>

    <h2>Add a family member</h2>
    <form method="post" action="/persons">
{fields}        <button class="button" type="submit">Create</button>
    </form>
    <p><a href="/">Back to menu</a></p>
"#,
        fields = person_form_fields(None),
    );

    Ok(page("Family Members", &body))
}

/// POST /persons
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<PersonForm>,
) -> ApiResult<Redirect> {
    let mut person = Person::new(String::new());
    form.apply(&mut person)?;

    db::persons::save_person(&state.db, &person).await?;
    tracing::info!(person = %person.display_name(), "person created");

    Ok(Redirect::to("/persons"))
}

/// GET /persons/:id/edit
pub async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let person = db::persons::load_person(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("person {id}")))?;

    let body = format!(
        r#"
    <form method="post" action="/persons/{id}/update">
{fields}        <button class="button" type="submit">Save</button>
        <a href="/persons">Cancel</a>
    </form>
"#,
        id = person.id,
        fields = person_form_fields(Some(&person)),
    );

    Ok(page("Edit Family Member", &body))
}

/// POST /persons/:id/update
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<PersonForm>,
) -> ApiResult<Redirect> {
    let mut person = db::persons::load_person(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("person {id}")))?;
    form.apply(&mut person)?;

    db::persons::update_person(&state.db, &person).await?;
    Ok(Redirect::to("/persons"))
}

/// POST /persons/:id/delete
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Redirect> {
    if !db::persons::delete_person(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("person {id}")));
    }
    tracing::info!(person = %id, "person deleted (face tags cascade)");
    Ok(Redirect::to("/persons"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/persons", get(list_page).post(create))
        .route("/persons/:id/edit", get(edit_page))
        .route("/persons/:id/update", post(update))
        .route("/persons/:id/delete", post(delete))
}
