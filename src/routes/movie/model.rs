use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub movie_id: Uuid,
    /// External catalogue identifier, unique when present.
    pub external_id: Option<String>,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub language: Option<String>,
    /// Cached aggregate over the current ratings; NULL when unrated.
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMovieRequest {
    pub external_id: Option<String>,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchMovieRequest {
    pub external_id: Option<String>,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub poster_url: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub language: Option<String>,
}

impl PatchMovieRequest {
    pub fn is_empty(&self) -> bool {
        self.external_id.is_none()
            && self.title.is_none()
            && self.year.is_none()
            && self.genre.is_none()
            && self.description.is_none()
            && self.poster_url.is_none()
            && self.runtime_minutes.is_none()
            && self.language.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const MOVIE_COLUMNS: &str = "movie_id, external_id, title, year, genre, description, poster_url, \
     runtime_minutes, language, rating_avg, rating_count, created_at, updated_at";

impl Movie {
    pub async fn list(
        pool: &PgPool,
        genre: Option<&str>,
        year: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {MOVIE_COLUMNS}
             FROM movies
             WHERE ($1::TEXT IS NULL OR genre = $1)
               AND ($2::INT IS NULL OR year = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(genre)
            .bind(year)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, movie_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE movie_id = $1");
        sqlx::query_as::<_, Movie>(&sql)
            .bind(movie_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn exists(pool: &PgPool, movie_id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM movies WHERE movie_id = $1)")
            .bind(movie_id)
            .fetch_one(pool)
            .await
    }

    pub async fn create(pool: &PgPool, req: &CreateMovieRequest) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO movies (movie_id, external_id, title, year, genre, description,
                                 poster_url, runtime_minutes, language, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW(), NOW())
             RETURNING {MOVIE_COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(Uuid::new_v4())
            .bind(req.external_id.as_deref())
            .bind(&req.title)
            .bind(req.year)
            .bind(&req.genre)
            .bind(req.description.as_deref())
            .bind(req.poster_url.as_deref())
            .bind(req.runtime_minutes)
            .bind(req.language.as_deref())
            .fetch_one(pool)
            .await
    }

    /// Full update; every described field is overwritten. The cached rating
    /// aggregates are not touched, they belong to the rating module.
    pub async fn replace(
        pool: &PgPool,
        movie_id: Uuid,
        req: &CreateMovieRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE movies
             SET external_id = $2, title = $3, year = $4, genre = $5, description = $6,
                 poster_url = $7, runtime_minutes = $8, language = $9, updated_at = NOW()
             WHERE movie_id = $1
             RETURNING {MOVIE_COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(movie_id)
            .bind(req.external_id.as_deref())
            .bind(&req.title)
            .bind(req.year)
            .bind(&req.genre)
            .bind(req.description.as_deref())
            .bind(req.poster_url.as_deref())
            .bind(req.runtime_minutes)
            .bind(req.language.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Partial update over the patchable field set; `Ok(None)` for an empty
    /// request, without touching the database.
    pub async fn merge(
        pool: &PgPool,
        movie_id: Uuid,
        req: &PatchMovieRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        if req.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "UPDATE movies
             SET external_id = COALESCE($2, external_id),
                 title = COALESCE($3, title),
                 year = COALESCE($4, year),
                 genre = COALESCE($5, genre),
                 description = COALESCE($6, description),
                 poster_url = COALESCE($7, poster_url),
                 runtime_minutes = COALESCE($8, runtime_minutes),
                 language = COALESCE($9, language),
                 updated_at = NOW()
             WHERE movie_id = $1
             RETURNING {MOVIE_COLUMNS}"
        );
        sqlx::query_as::<_, Movie>(&sql)
            .bind(movie_id)
            .bind(req.external_id.as_deref())
            .bind(req.title.as_deref())
            .bind(req.year)
            .bind(req.genre.as_deref())
            .bind(req.description.as_deref())
            .bind(req.poster_url.as_deref())
            .bind(req.runtime_minutes)
            .bind(req.language.as_deref())
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, movie_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM movies WHERE movie_id = $1")
            .bind(movie_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_movie_patch_is_detected() {
        let req = PatchMovieRequest {
            external_id: None,
            title: None,
            year: None,
            genre: None,
            description: None,
            poster_url: None,
            runtime_minutes: None,
            language: None,
        };
        assert!(req.is_empty());

        let req = PatchMovieRequest {
            title: Some("Alien".into()),
            ..req
        };
        assert!(!req.is_empty());
    }

    #[test]
    fn unrated_movie_serializes_null_average() {
        let movie = Movie {
            movie_id: Uuid::new_v4(),
            external_id: None,
            title: "Alien".into(),
            year: 1979,
            genre: "Horror".into(),
            description: None,
            poster_url: None,
            runtime_minutes: Some(117),
            language: Some("en".into()),
            rating_avg: None,
            rating_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert!(json["rating_avg"].is_null());
        assert_eq!(json["rating_count"], 0);
    }
}
