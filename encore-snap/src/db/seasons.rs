//! Season lookups (read-only)

use encore_common::db::Season;
use encore_common::Result;
use sqlx::SqlitePool;
use tracing::warn;

/// Load the active season, if any
///
/// More than one active season is not expected. If it happens the season
/// with the latest parsed start wins (ties go to the highest id) and a
/// warning is logged. Any active season with an unparseable `start_date`
/// is an error.
pub async fn load_active_season(pool: &SqlitePool) -> Result<Option<Season>> {
    let seasons: Vec<Season> = sqlx::query_as(
        r#"
        SELECT id, name, start_date, end_date, is_active
        FROM seasons
        WHERE is_active = 1
        "#,
    )
    .fetch_all(pool)
    .await?;

    // Stored dates mix formats and offsets, so compare parsed instants
    let mut dated = Vec::with_capacity(seasons.len());
    for season in seasons {
        dated.push((season.start()?, season));
    }

    let active_count = dated.len();
    let chosen = dated
        .into_iter()
        .max_by_key(|(start, season)| (*start, season.id))
        .map(|(_, season)| season);

    if active_count > 1 {
        if let Some(season) = &chosen {
            warn!(
                active_seasons = active_count,
                chosen = season.id,
                "Multiple seasons flagged active; using the latest start_date"
            );
        }
    }

    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    async fn insert_season(pool: &SqlitePool, name: &str, start: &str, active: bool) -> i64 {
        sqlx::query("INSERT INTO seasons (name, start_date, is_active) VALUES (?, ?, ?)")
            .bind(name)
            .bind(start)
            .bind(active)
            .execute(pool)
            .await
            .unwrap()
            .last_insert_rowid()
    }

    #[tokio::test]
    async fn test_no_seasons() {
        let pool = setup_test_db().await;
        assert!(load_active_season(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_inactive_seasons_ignored() {
        let pool = setup_test_db().await;
        insert_season(&pool, "Old", "2024-01-01", false).await;
        assert!(load_active_season(&pool).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_active_season() {
        let pool = setup_test_db().await;
        insert_season(&pool, "Old", "2024-01-01", false).await;
        let id = insert_season(&pool, "Current", "2025-01-06", true).await;

        let season = load_active_season(&pool).await.unwrap().unwrap();
        assert_eq!(season.id, id);
        assert_eq!(season.name, "Current");
        assert!(season.is_active);
    }

    #[tokio::test]
    async fn test_multiple_active_picks_latest_start() {
        let pool = setup_test_db().await;
        insert_season(&pool, "Earlier", "2025-01-06", true).await;
        let later = insert_season(&pool, "Later", "2025-04-07", true).await;

        let season = load_active_season(&pool).await.unwrap().unwrap();
        assert_eq!(season.id, later);
    }

    #[tokio::test]
    async fn test_multiple_active_compares_instants_not_text() {
        let pool = setup_test_db().await;
        // 2025-04-07T00:00Z sorts after this as text but is earlier in time
        insert_season(&pool, "PlainDate", "2025-04-07", true).await;
        let offset = insert_season(&pool, "Offset", "2025-04-06T23:00:00-05:00", true).await;

        let season = load_active_season(&pool).await.unwrap().unwrap();
        assert_eq!(season.id, offset);
        assert_eq!(season.name, "Offset");
    }

    #[tokio::test]
    async fn test_equal_starts_pick_highest_id() {
        let pool = setup_test_db().await;
        insert_season(&pool, "First", "2025-04-07", true).await;
        let second = insert_season(&pool, "Second", "2025-04-07T00:00:00Z", true).await;

        let season = load_active_season(&pool).await.unwrap().unwrap();
        assert_eq!(season.id, second);
    }

    #[tokio::test]
    async fn test_unparseable_active_start_is_error() {
        let pool = setup_test_db().await;
        insert_season(&pool, "Good", "2025-04-07", true).await;
        insert_season(&pool, "Bad", "someday", true).await;

        assert!(load_active_season(&pool).await.is_err());
    }
}
