//! Repository backend tests
//!
//! Exercises the sea-orm repository against a real sqlite database:
//! insert/lookup round trip, duplicate-id rejection, and missing keys.

use chrono::Utc;
use tempfile::TempDir;

use shortgate::repository::LinkRecord;
use shortgate::repository::LinkRepository;
use shortgate::repository::backends::sea_orm::SeaOrmRepository;

async fn test_repository(dir: &TempDir) -> SeaOrmRepository {
    let db_path = dir.path().join("storage_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    SeaOrmRepository::new(&db_url, "sqlite")
        .await
        .expect("Failed to create sqlite repository")
}

fn record(short_id: &str, url: &str) -> LinkRecord {
    LinkRecord {
        short_id: short_id.to_string(),
        original_url: url.to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_insert_and_lookup_round_trip() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir).await;

    repo.insert(record("a1B2c3", "https://example.com/some/path"))
        .await
        .unwrap();

    let found = repo.lookup("a1B2c3").await.unwrap().expect("link must exist");
    assert_eq!(found.short_id, "a1B2c3");
    assert_eq!(found.original_url, "https://example.com/some/path");
}

#[tokio::test]
async fn test_duplicate_short_id_is_a_collision() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir).await;

    repo.insert(record("dupdup", "https://example.com/first"))
        .await
        .unwrap();

    let err = repo
        .insert(record("dupdup", "https://example.com/second"))
        .await
        .expect_err("second insert with the same id must fail");
    assert!(err.is_collision(), "expected collision, got: {}", err);

    // The original mapping is untouched.
    let found = repo.lookup("dupdup").await.unwrap().unwrap();
    assert_eq!(found.original_url, "https://example.com/first");
}

#[tokio::test]
async fn test_lookup_missing_id_is_none() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir).await;

    let found = repo.lookup("nosuch").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_ids_are_case_sensitive() {
    let dir = TempDir::new().unwrap();
    let repo = test_repository(&dir).await;

    repo.insert(record("CaseID", "https://example.com/upper"))
        .await
        .unwrap();

    let found = repo.lookup("caseid").await.unwrap();
    assert!(found.is_none(), "lookups must not case-fold identifiers");
}
