//! Artist cache operations

use encore_common::db::{ArtistMetrics, TrackedArtist};
use encore_common::{Error, Result};
use sqlx::SqlitePool;

/// Load every cached artist, ordered by id
pub async fn load_tracked_artists(pool: &SqlitePool) -> Result<Vec<TrackedArtist>> {
    let artists = sqlx::query_as(
        r#"
        SELECT spotify_id, current_popularity, current_followers
        FROM artists_cache
        ORDER BY spotify_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(artists)
}

/// Ids of every cached artist
pub async fn list_tracked_ids(pool: &SqlitePool) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar("SELECT spotify_id FROM artists_cache ORDER BY spotify_id")
        .fetch_all(pool)
        .await?;

    Ok(ids)
}

/// Insert or update cache rows from fresh provider metrics
///
/// Runs in one transaction; returns the number of rows written.
pub async fn upsert_artist_metrics(pool: &SqlitePool, metrics: &[ArtistMetrics]) -> Result<u64> {
    if metrics.is_empty() {
        return Ok(0);
    }

    let mut tx = pool.begin().await?;
    let mut written = 0;

    for artist in metrics {
        let genres = serde_json::to_string(&artist.genres)
            .map_err(|e| Error::Internal(format!("Serialize genres failed: {}", e)))?;

        written += sqlx::query(
            r#"
            INSERT INTO artists_cache (
                spotify_id, name, image_url, genres,
                current_popularity, current_followers, last_updated
            ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(spotify_id) DO UPDATE SET
                name = excluded.name,
                image_url = excluded.image_url,
                genres = excluded.genres,
                current_popularity = excluded.current_popularity,
                current_followers = excluded.current_followers,
                last_updated = CURRENT_TIMESTAMP
            "#,
        )
        .bind(&artist.spotify_id)
        .bind(&artist.name)
        .bind(&artist.image_url)
        .bind(genres)
        .bind(artist.popularity)
        .bind(artist.followers)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_db;

    fn metrics(id: &str, popularity: i64, followers: i64) -> ArtistMetrics {
        ArtistMetrics {
            spotify_id: id.to_string(),
            name: format!("Artist {}", id),
            image_url: None,
            genres: vec!["indie".to_string()],
            popularity,
            followers,
        }
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_updates() {
        let pool = setup_test_db().await;

        upsert_artist_metrics(&pool, &[metrics("B", 10, 100), metrics("A", 20, 200)])
            .await
            .unwrap();
        upsert_artist_metrics(&pool, &[metrics("A", 25, 260)]).await.unwrap();

        let artists = load_tracked_artists(&pool).await.unwrap();
        assert_eq!(
            artists,
            vec![
                TrackedArtist {
                    spotify_id: "A".to_string(),
                    current_popularity: 25,
                    current_followers: 260,
                },
                TrackedArtist {
                    spotify_id: "B".to_string(),
                    current_popularity: 10,
                    current_followers: 100,
                },
            ]
        );

        let genres: String =
            sqlx::query_scalar("SELECT genres FROM artists_cache WHERE spotify_id = 'A'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(genres, r#"["indie"]"#);
    }

    #[tokio::test]
    async fn test_upsert_empty_is_noop() {
        let pool = setup_test_db().await;
        assert_eq!(upsert_artist_metrics(&pool, &[]).await.unwrap(), 0);
        assert!(list_tracked_ids(&pool).await.unwrap().is_empty());
    }
}
