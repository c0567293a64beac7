//! End-to-end tagging workflow tests over a fake detector and photo source

mod helpers;

use helpers::{boxed_detector, png_bytes, test_workflow, test_workflow_with_ttl, FakeDetector, FakeSource};
use heirloom::db;
use heirloom::models::{FaceTag, Person};
use heirloom::tagging::{FacePick, WorkflowError};
use uuid::Uuid;

#[tokio::test]
async fn analyze_offers_one_crop_per_detected_face() {
    let (dir, pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 50, 50)]));

    db::persons::save_person(&pool, &Person::new("Luisa".to_string()))
        .await
        .expect("save person");

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    assert_eq!(outcome.crops.len(), 1);
    assert_eq!(outcome.crops[0].index, 0);
    assert_eq!(outcome.source_file_id, "photo-1");
    assert_eq!(outcome.persons.len(), 1, "registry offered for selection");

    let crop_file = dir
        .path()
        .join("scratch")
        .join(outcome.token.to_string())
        .join("face_0.jpg");
    assert!(crop_file.exists(), "crop written to the session arena");

    let written = image::open(&crop_file).expect("crop decodes");
    assert_eq!((written.width(), written.height()), (50, 50));
}

#[tokio::test]
async fn analyze_with_zero_faces_is_an_empty_success() {
    let (_dir, _pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(80, 60));
    let detector = boxed_detector(FakeDetector::empty());

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    assert!(outcome.crops.is_empty());
}

#[tokio::test]
async fn analyze_undecodable_bytes_fails_and_writes_nothing() {
    let (dir, _pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", b"definitely not an image".to_vec());
    let detector = boxed_detector(FakeDetector::with_boxes(&[(0, 0, 10, 10)]));

    let error = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect_err("must fail");
    assert!(matches!(error, WorkflowError::Decode(_)), "got {error:?}");

    let scratch_entries: Vec<_> = std::fs::read_dir(dir.path().join("scratch"))
        .expect("scratch root")
        .collect();
    assert!(scratch_entries.is_empty(), "no arena left behind");
}

#[tokio::test]
async fn analyze_missing_remote_file_is_a_fetch_error() {
    let (_dir, _pool, workflow) = test_workflow().await;
    let source = FakeSource::default();
    let detector = boxed_detector(FakeDetector::empty());

    let error = workflow
        .analyze(&source, &detector, "ghost")
        .await
        .expect_err("must fail");
    assert!(matches!(error, WorkflowError::Source(_)), "got {error:?}");
}

#[tokio::test]
async fn commit_moves_crop_and_creates_tag() {
    let (dir, pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-42", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 50, 50)]));

    let person = Person::new("Luisa".to_string());
    db::persons::save_person(&pool, &person)
        .await
        .expect("save person");

    let outcome = workflow
        .analyze(&source, &detector, "photo-42")
        .await
        .expect("analyze");

    let result = workflow
        .commit(
            outcome.token,
            &[FacePick {
                index: 0,
                person_id: Some(person.id),
            }],
        )
        .await
        .expect("commit");

    assert_eq!(result.created, 1);
    assert_eq!(result.skipped, 0);

    let permanent = dir.path().join("permanent").join("Luisa_face_0.jpg");
    assert!(permanent.exists(), "crop promoted to permanent storage");

    let scratch = dir.path().join("scratch").join(outcome.token.to_string());
    assert!(!scratch.exists(), "session arena discarded");

    let crops = db::face_tags::list_tagged_crops(&pool).await.expect("list");
    assert_eq!(crops.len(), 1);
    assert_eq!(crops[0].tag.person_id, Some(person.id));
    assert_eq!(crops[0].tag.crop_path, "permanent/Luisa_face_0.jpg");
    assert_eq!(crops[0].tag.source_file_id, "photo-42");
    assert_eq!(crops[0].person_name.as_deref(), Some("Luisa"));
}

#[tokio::test]
async fn commit_skips_missing_crop_index_without_a_record() {
    let (_dir, pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 40, 40)]));

    let person = Person::new("Marco".to_string());
    db::persons::save_person(&pool, &person)
        .await
        .expect("save person");

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    let result = workflow
        .commit(
            outcome.token,
            &[FacePick {
                index: 7,
                person_id: Some(person.id),
            }],
        )
        .await
        .expect("commit");

    assert_eq!(result.created, 0);
    assert_eq!(result.skipped, 1);

    let crops = db::face_tags::list_tagged_crops(&pool).await.expect("list");
    assert!(crops.is_empty(), "no record for the missing crop");
}

#[tokio::test]
async fn commit_skips_unselected_picks() {
    let (_dir, pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 40, 40)]));

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    let result = workflow
        .commit(
            outcome.token,
            &[FacePick {
                index: 0,
                person_id: None,
            }],
        )
        .await
        .expect("commit");

    assert_eq!(result.created, 0);
    assert_eq!(result.skipped, 1);
    let crops = db::face_tags::list_tagged_crops(&pool).await.expect("list");
    assert!(crops.is_empty());
}

#[tokio::test]
async fn commit_naming_unknown_person_aborts() {
    let (_dir, pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 40, 40)]));

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    let error = workflow
        .commit(
            outcome.token,
            &[FacePick {
                index: 0,
                person_id: Some(Uuid::new_v4()),
            }],
        )
        .await
        .expect_err("must fail");

    assert!(matches!(error, WorkflowError::PersonNotFound(_)), "got {error:?}");
    let crops = db::face_tags::list_tagged_crops(&pool).await.expect("list");
    assert!(crops.is_empty());
}

#[tokio::test]
async fn commit_against_unknown_token_errors() {
    let (_dir, _pool, workflow) = test_workflow().await;

    let error = workflow
        .commit(Uuid::new_v4(), &[])
        .await
        .expect_err("must fail");
    assert!(matches!(error, WorkflowError::UnknownSession(_)), "got {error:?}");
}

#[tokio::test]
async fn commit_against_expired_session_errors() {
    let (_dir, _pool, workflow) = test_workflow_with_ttl(0).await;
    let source = FakeSource::with_file("photo-1", png_bytes(60, 60));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(5, 5, 20, 20)]));

    let outcome = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    // TTL of zero: the session is already stale by commit time.
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let error = workflow
        .commit(
            outcome.token,
            &[FacePick {
                index: 0,
                person_id: None,
            }],
        )
        .await
        .expect_err("must fail");
    assert!(matches!(error, WorkflowError::UnknownSession(_)), "got {error:?}");
}

#[tokio::test]
async fn delete_tag_removes_file_and_record() {
    let (dir, pool, workflow) = test_workflow().await;

    let crop_path = "permanent/Marco_face_0.jpg";
    std::fs::write(dir.path().join(crop_path), b"jpeg").expect("write crop");
    let tag = FaceTag::new(None, crop_path.to_string(), "photo-9".to_string());
    db::face_tags::save_face_tag(&pool, &tag)
        .await
        .expect("save tag");

    workflow.delete_tag(tag.id).await.expect("delete");

    assert!(!dir.path().join(crop_path).exists(), "backing file removed");
    assert!(db::face_tags::load_face_tag(&pool, tag.id)
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn delete_tag_with_externally_removed_file_still_succeeds() {
    let (_dir, pool, workflow) = test_workflow().await;

    let tag = FaceTag::new(None, "permanent/gone.jpg".to_string(), "photo-9".to_string());
    db::face_tags::save_face_tag(&pool, &tag)
        .await
        .expect("save tag");

    workflow.delete_tag(tag.id).await.expect("delete");

    assert!(db::face_tags::load_face_tag(&pool, tag.id)
        .await
        .expect("load")
        .is_none());
}

#[tokio::test]
async fn delete_unknown_tag_errors() {
    let (_dir, _pool, workflow) = test_workflow().await;

    let error = workflow
        .delete_tag(Uuid::new_v4())
        .await
        .expect_err("must fail");
    assert!(matches!(error, WorkflowError::TagNotFound(_)), "got {error:?}");
}

#[tokio::test]
async fn reconcile_removes_only_unreferenced_crops() {
    let (dir, pool, workflow) = test_workflow().await;

    std::fs::write(dir.path().join("permanent/kept.jpg"), b"k").expect("write");
    std::fs::write(dir.path().join("permanent/orphan.jpg"), b"o").expect("write");
    let tag = FaceTag::new(None, "permanent/kept.jpg".to_string(), "p".to_string());
    db::face_tags::save_face_tag(&pool, &tag)
        .await
        .expect("save tag");

    let removed = workflow.reconcile().await.expect("reconcile");

    assert_eq!(removed, 1);
    assert!(dir.path().join("permanent/kept.jpg").exists());
    assert!(!dir.path().join("permanent/orphan.jpg").exists());
}

#[tokio::test]
async fn second_analyze_leaves_prior_session_intact() {
    let (dir, _pool, workflow) = test_workflow().await;
    let source = FakeSource::with_file("photo-1", png_bytes(100, 100));
    let detector = boxed_detector(FakeDetector::with_boxes(&[(10, 10, 40, 40)]));

    let first = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");
    let second = workflow
        .analyze(&source, &detector, "photo-1")
        .await
        .expect("analyze");

    assert_ne!(first.token, second.token);
    let scratch = dir.path().join("scratch");
    assert!(scratch.join(first.token.to_string()).join("face_0.jpg").exists());
    assert!(scratch.join(second.token.to_string()).join("face_0.jpg").exists());
}
