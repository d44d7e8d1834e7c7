use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub rating_id: Uuid,
    pub user_id: Uuid,
    pub movie_id: Uuid,
    /// Scale 0-100.
    pub value: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct RatingWithAuthor {
    pub rating_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub movie_id: Uuid,
    pub value: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRatingRequest {
    pub movie_id: Uuid,
    pub value: i32,
    pub review: Option<String>,
}

const RATING_COLUMNS: &str =
    "rating_id, user_id, movie_id, value, review, created_at, updated_at";

impl Rating {
    /// Insert-or-update keyed on (user, movie), then recompute the movie's
    /// cached `rating_avg`/`rating_count` from the full current rating set.
    /// Both statements run in one transaction so readers never observe a
    /// stale aggregate after a completed call.
    pub async fn upsert(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Uuid,
        value: i32,
        review: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "INSERT INTO ratings (rating_id, user_id, movie_id, value, review, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
             ON CONFLICT (user_id, movie_id)
             DO UPDATE SET value = EXCLUDED.value, review = EXCLUDED.review, updated_at = NOW()
             RETURNING {RATING_COLUMNS}"
        );
        let rating = sqlx::query_as::<_, Rating>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(movie_id)
            .bind(value)
            .bind(review)
            .fetch_one(&mut *tx)
            .await?;

        Self::recompute_movie_aggregate(&mut tx, movie_id).await?;

        tx.commit().await?;

        Ok(rating)
    }

    /// Removes the requester's rating and recomputes the aggregate in the
    /// same transaction. Returns false when no rating existed.
    pub async fn delete(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query("DELETE FROM ratings WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        Self::recompute_movie_aggregate(&mut tx, movie_id).await?;

        tx.commit().await?;

        Ok(true)
    }

    /// AVG over zero rows is NULL, which is exactly the "unrated" state the
    /// movie row carries.
    pub(crate) async fn recompute_movie_aggregate(
        tx: &mut Transaction<'_, Postgres>,
        movie_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE movies
             SET rating_avg = agg.avg, rating_count = agg.cnt
             FROM (
                 SELECT AVG(value)::DOUBLE PRECISION AS avg, COUNT(*) AS cnt
                 FROM ratings
                 WHERE movie_id = $1
             ) AS agg
             WHERE movies.movie_id = $1",
        )
        .bind(movie_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn find_for_user_and_movie(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql =
            format!("SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = $1 AND movie_id = $2");
        sqlx::query_as::<_, Rating>(&sql)
            .bind(user_id)
            .bind(movie_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_movie(
        pool: &PgPool,
        movie_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RatingWithAuthor>, sqlx::Error> {
        sqlx::query_as::<_, RatingWithAuthor>(
            "SELECT r.rating_id, r.user_id, u.username, r.movie_id, r.value, r.review,
                    r.created_at, r.updated_at
             FROM ratings r
             JOIN users u ON r.user_id = u.user_id
             WHERE r.movie_id = $1
             ORDER BY r.created_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(movie_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_movie(pool: &PgPool, movie_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM ratings WHERE movie_id = $1")
            .bind(movie_id)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE user_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Rating>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
