//! Person table operations

use crate::models::{Kinship, Person};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn row_to_person(row: &SqliteRow) -> Result<Person> {
    let id: String = row.get("id");
    let kinship: Option<String> = row.get("kinship");
    let birth_date: Option<String> = row.get("birth_date");
    let created_at: String = row.get("created_at");

    Ok(Person {
        id: Uuid::parse_str(&id)?,
        given_name: row.get("given_name"),
        family_name: row.get("family_name"),
        kinship: kinship
            .map(|k| k.parse::<Kinship>().map_err(anyhow::Error::msg))
            .transpose()?,
        birth_date: birth_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()?,
        biography: row.get("biography"),
        recognition_tag: row.get("recognition_tag"),
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
    })
}

/// Insert a new person.
pub async fn save_person(pool: &SqlitePool, person: &Person) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO persons (
            id, given_name, family_name, kinship, birth_date,
            biography, recognition_tag, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(person.id.to_string())
    .bind(&person.given_name)
    .bind(&person.family_name)
    .bind(person.kinship.map(|k| k.as_str()))
    .bind(person.birth_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(&person.biography)
    .bind(&person.recognition_tag)
    .bind(person.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Update an existing person. Returns false when the id does not exist.
pub async fn update_person(pool: &SqlitePool, person: &Person) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE persons SET
            given_name = ?,
            family_name = ?,
            kinship = ?,
            birth_date = ?,
            biography = ?,
            recognition_tag = ?
        WHERE id = ?
        "#,
    )
    .bind(&person.given_name)
    .bind(&person.family_name)
    .bind(person.kinship.map(|k| k.as_str()))
    .bind(person.birth_date.map(|d| d.format("%Y-%m-%d").to_string()))
    .bind(&person.biography)
    .bind(&person.recognition_tag)
    .bind(person.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Load one person by id.
pub async fn load_person(pool: &SqlitePool, id: Uuid) -> Result<Option<Person>> {
    let row = sqlx::query(
        r#"
        SELECT id, given_name, family_name, kinship, birth_date,
               biography, recognition_tag, created_at
        FROM persons
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_person).transpose()
}

/// Load the full registry, ordered by given name. No pagination: the
/// registry is a handful of family members.
pub async fn list_persons(pool: &SqlitePool) -> Result<Vec<Person>> {
    let rows = sqlx::query(
        r#"
        SELECT id, given_name, family_name, kinship, birth_date,
               biography, recognition_tag, created_at
        FROM persons
        ORDER BY given_name, family_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(row_to_person).collect()
}

/// Delete a person. Associated face tags are removed by the cascade.
/// Returns false when the id does not exist.
pub async fn delete_person(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM persons WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
