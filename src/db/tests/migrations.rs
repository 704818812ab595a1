use crate::db::*;
use tempfile::{NamedTempFile, tempdir};

#[tokio::test]
async fn test_database_creation() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let mut conn = db.pool.acquire().await.unwrap();

    let tables: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .fetch_all(&mut *conn)
            .await
            .unwrap();

    assert!(tables.contains(&"podcasts".to_string()));
    assert!(tables.contains(&"items".to_string()));
    assert!(tables.contains(&"schema_version".to_string()));

    let indexes: Vec<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='index' AND tbl_name='items'")
            .fetch_all(&mut *conn)
            .await
            .unwrap();

    for expected in [
        "idx_items_status",
        "idx_items_podcast",
        "idx_items_pub_date",
        "idx_items_download_date",
    ] {
        assert!(
            indexes.contains(&expected.to_string()),
            "missing index {expected}, have {indexes:?}"
        );
    }

    drop(conn);
    db.close().await;
}

#[tokio::test]
async fn test_migrations_are_recorded_once() {
    let temp_file = NamedTempFile::new().unwrap();

    let db = Database::new(temp_file.path()).await.unwrap();
    db.close().await;

    // Re-opening must not re-apply migrations
    let db = Database::new(temp_file.path()).await.unwrap();

    let versions: Vec<i64> = sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version")
        .fetch_all(db.pool())
        .await
        .unwrap();
    assert_eq!(versions, vec![1, 2]);

    db.close().await;
}

#[tokio::test]
async fn test_database_creates_missing_parent_directory() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("nested").join("data").join("items.db");

    let db = Database::new(&db_path).await.unwrap();

    assert!(db_path.exists());
    db.close().await;
}
