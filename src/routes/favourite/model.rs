use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Favourite {
    pub user_id: Uuid,
    pub movie_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Favourite joined with its movie for listing screens.
#[derive(Debug, Serialize, FromRow)]
pub struct FavouriteMovie {
    pub movie_id: Uuid,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub poster_url: Option<String>,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    pub favourited_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AddFavouriteRequest {
    pub movie_id: Uuid,
}

impl Favourite {
    /// Insert-or-ignore; `None` means the pair already existed and nothing
    /// was inserted.
    pub async fn add(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Favourite>(
            "INSERT INTO favourites (user_id, movie_id, created_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (user_id, movie_id) DO NOTHING
             RETURNING user_id, movie_id, created_at",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn remove(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM favourites WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<FavouriteMovie>, sqlx::Error> {
        sqlx::query_as::<_, FavouriteMovie>(
            "SELECT m.movie_id, m.title, m.year, m.genre, m.poster_url,
                    m.rating_avg, m.rating_count, f.created_at AS favourited_at
             FROM favourites f
             JOIN movies m ON f.movie_id = m.movie_id
             WHERE f.user_id = $1
             ORDER BY f.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
