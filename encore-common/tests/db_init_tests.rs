//! Database initialization tests
//!
//! Covers first-run creation, reopening, schema contents and the v1
//! de-duplication migration.

use encore_common::db::{get_schema_version, init_database, CURRENT_SCHEMA_VERSION};
use tempfile::TempDir;

#[tokio::test]
async fn test_database_creation_when_missing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("encore.db");

    let result = init_database(&db_path).await;

    assert!(result.is_ok(), "Database initialization failed: {:?}", result.err());
    assert!(db_path.exists(), "Database file was not created");
}

#[tokio::test]
async fn test_database_opens_existing() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("encore.db");

    let pool1 = init_database(&db_path).await.unwrap();
    pool1.close().await;

    let pool2 = init_database(&db_path).await;
    assert!(pool2.is_ok(), "Failed to open existing database: {:?}", pool2.err());
}

#[tokio::test]
async fn test_core_tables_exist() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("encore.db")).await.unwrap();

    for table in ["seasons", "artists_cache", "weekly_snapshots", "schema_version"] {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name=?)",
        )
        .bind(table)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert!(exists, "table {} missing", table);
    }

    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_unique_week_artist_index_rejects_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let pool = init_database(&temp_dir.path().join("encore.db")).await.unwrap();

    sqlx::query(
        "INSERT INTO weekly_snapshots (week_number, artist_id, popularity, followers) VALUES (1, 'A', 50, 100)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let duplicate = sqlx::query(
        "INSERT INTO weekly_snapshots (week_number, artist_id, popularity, followers) VALUES (1, 'A', 51, 101)",
    )
    .execute(&pool)
    .await;

    assert!(duplicate.is_err(), "duplicate (week, artist) should be rejected");
}

#[tokio::test]
async fn test_migration_removes_preexisting_duplicates() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("legacy.db");

    // Legacy database: snapshots table without the unique index
    {
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
        sqlx::query(
            r#"
            CREATE TABLE weekly_snapshots (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                week_number INTEGER NOT NULL,
                artist_id TEXT NOT NULL,
                popularity INTEGER NOT NULL,
                followers INTEGER NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .unwrap();
        for (week, artist, popularity) in [(2, "A", 40), (2, "A", 41), (2, "B", 70), (3, "A", 42)] {
            sqlx::query(
                "INSERT INTO weekly_snapshots (week_number, artist_id, popularity, followers) VALUES (?, ?, ?, 0)",
            )
            .bind(week)
            .bind(artist)
            .bind(popularity)
            .execute(&pool)
            .await
            .unwrap();
        }
        pool.close().await;
    }

    let pool = init_database(&db_path).await.unwrap();

    let rows: Vec<(i64, String, i64)> = sqlx::query_as(
        "SELECT week_number, artist_id, popularity FROM weekly_snapshots ORDER BY week_number, artist_id",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    assert_eq!(
        rows,
        vec![
            (2, "A".to_string(), 40),
            (2, "B".to_string(), 70),
            (3, "A".to_string(), 42),
        ]
    );
}
