//! Weekly snapshot operations

use encore_common::db::WeeklySnapshot;
use encore_common::Result;
use sqlx::SqlitePool;
use std::collections::HashSet;

/// Artist ids already snapshotted for `week_number`
pub async fn snapshotted_artist_ids(
    pool: &SqlitePool,
    week_number: i64,
) -> Result<HashSet<String>> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT artist_id FROM weekly_snapshots WHERE week_number = ?")
            .bind(week_number)
            .fetch_all(pool)
            .await?;

    Ok(ids.into_iter().collect())
}

/// Insert a batch of snapshots in one transaction
///
/// Rows whose `(week_number, artist_id)` already exists are skipped by the
/// unique index. Returns the number of rows actually inserted. Any other
/// failure rolls back the whole batch.
pub async fn insert_snapshots(pool: &SqlitePool, snapshots: &[WeeklySnapshot]) -> Result<u64> {
    if snapshots.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for snapshot in snapshots {
        inserted += sqlx::query(
            r#"
            INSERT INTO weekly_snapshots (week_number, artist_id, popularity, followers)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(week_number, artist_id) DO NOTHING
            "#,
        )
        .bind(snapshot.week_number)
        .bind(&snapshot.artist_id)
        .bind(snapshot.popularity)
        .bind(snapshot.followers)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// All snapshots recorded for `week_number`, ordered by artist id
pub async fn load_week(pool: &SqlitePool, week_number: i64) -> Result<Vec<WeeklySnapshot>> {
    let rows = sqlx::query_as(
        r#"
        SELECT week_number, artist_id, popularity, followers
        FROM weekly_snapshots
        WHERE week_number = ?
        ORDER BY artist_id
        "#,
    )
    .bind(week_number)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
