//! Face tag table operations

use crate::models::{FaceTag, TaggedCrop};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

fn row_to_tag(row: &SqliteRow) -> Result<FaceTag> {
    let id: String = row.get("id");
    let person_id: Option<String> = row.get("person_id");
    let created_at: String = row.get("created_at");

    Ok(FaceTag {
        id: Uuid::parse_str(&id)?,
        person_id: person_id.map(|p| Uuid::parse_str(&p)).transpose()?,
        crop_path: row.get("crop_path"),
        source_file_id: row.get("source_file_id"),
        created_at: DateTime::parse_from_rfc3339(&created_at)?.with_timezone(&Utc),
    })
}

/// Insert a new face tag.
pub async fn save_face_tag(pool: &SqlitePool, tag: &FaceTag) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO face_tags (id, person_id, crop_path, source_file_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(tag.id.to_string())
    .bind(tag.person_id.map(|p| p.to_string()))
    .bind(&tag.crop_path)
    .bind(&tag.source_file_id)
    .bind(tag.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one face tag by id.
pub async fn load_face_tag(pool: &SqlitePool, id: Uuid) -> Result<Option<FaceTag>> {
    let row = sqlx::query(
        r#"
        SELECT id, person_id, crop_path, source_file_id, created_at
        FROM face_tags
        WHERE id = ?
        "#,
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(row_to_tag).transpose()
}

/// All face tags joined to their person's name, grouped by person for the
/// gallery. Unidentified crops sort last.
pub async fn list_tagged_crops(pool: &SqlitePool) -> Result<Vec<TaggedCrop>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.person_id, t.crop_path, t.source_file_id, t.created_at,
               p.given_name, p.family_name
        FROM face_tags t
        LEFT JOIN persons p ON p.id = t.person_id
        ORDER BY p.given_name IS NULL, p.given_name, t.created_at
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let tag = row_to_tag(row)?;
            let given: Option<String> = row.get("given_name");
            let family: Option<String> = row.get("family_name");
            let person_name = given.map(|g| match family {
                Some(f) => format!("{g} {f}"),
                None => g,
            });
            Ok(TaggedCrop { tag, person_name })
        })
        .collect()
}

/// Every crop_path currently referenced by a face tag. Used by the
/// startup reconciliation sweep.
pub async fn list_crop_paths(pool: &SqlitePool) -> Result<Vec<String>> {
    let paths = sqlx::query_scalar::<_, String>("SELECT crop_path FROM face_tags")
        .fetch_all(pool)
        .await?;
    Ok(paths)
}

/// Delete one face tag. Returns false when the id does not exist.
pub async fn delete_face_tag(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM face_tags WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::persons::save_person;
    use crate::models::Person;

    async fn pool() -> SqlitePool {
        crate::db::init_memory_pool()
            .await
            .expect("in-memory pool")
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let pool = pool().await;

        let person = Person::new("Marco".to_string());
        save_person(&pool, &person).await.expect("save person");

        let tag = FaceTag::new(
            Some(person.id),
            "permanent/Marco_face_0.jpg".to_string(),
            "drive-abc".to_string(),
        );
        save_face_tag(&pool, &tag).await.expect("save tag");

        let loaded = load_face_tag(&pool, tag.id)
            .await
            .expect("load")
            .expect("present");
        assert_eq!(loaded.person_id, Some(person.id));
        assert_eq!(loaded.crop_path, "permanent/Marco_face_0.jpg");
        assert_eq!(loaded.source_file_id, "drive-abc");
    }

    #[tokio::test]
    async fn unidentified_crop_is_allowed_and_listed() {
        let pool = pool().await;

        let tag = FaceTag::new(None, "permanent/face_3.jpg".to_string(), "drive-x".to_string());
        save_face_tag(&pool, &tag).await.expect("save tag");

        let crops = list_tagged_crops(&pool).await.expect("list");
        assert_eq!(crops.len(), 1);
        assert!(crops[0].person_name.is_none());
    }

    #[tokio::test]
    async fn listing_joins_names_and_sorts_unidentified_last() {
        let pool = pool().await;

        let mut ana = Person::new("Ana".to_string());
        ana.family_name = Some("Reyes".to_string());
        save_person(&pool, &ana).await.expect("save person");

        save_face_tag(
            &pool,
            &FaceTag::new(None, "permanent/face_9.jpg".to_string(), "d1".to_string()),
        )
        .await
        .expect("save tag");
        save_face_tag(
            &pool,
            &FaceTag::new(
                Some(ana.id),
                "permanent/Ana_face_0.jpg".to_string(),
                "d2".to_string(),
            ),
        )
        .await
        .expect("save tag");

        let crops = list_tagged_crops(&pool).await.expect("list");
        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].person_name.as_deref(), Some("Ana Reyes"));
        assert!(crops[1].person_name.is_none());
    }

    #[tokio::test]
    async fn delete_reports_outcome() {
        let pool = pool().await;

        let tag = FaceTag::new(None, "permanent/face_0.jpg".to_string(), "d".to_string());
        save_face_tag(&pool, &tag).await.expect("save tag");

        assert!(delete_face_tag(&pool, tag.id).await.expect("delete"));
        assert!(!delete_face_tag(&pool, tag.id).await.expect("delete"));
    }

    #[tokio::test]
    async fn crop_paths_cover_all_tags() {
        let pool = pool().await;

        for i in 0..2 {
            save_face_tag(
                &pool,
                &FaceTag::new(None, format!("permanent/face_{i}.jpg"), "d".to_string()),
            )
            .await
            .expect("save tag");
        }

        let mut paths = list_crop_paths(&pool).await.expect("paths");
        paths.sort();
        assert_eq!(paths, vec!["permanent/face_0.jpg", "permanent/face_1.jpg"]);
    }
}
