use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::group::model::GroupMember;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct List {
    pub list_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Exactly one of the two owner columns is set.
    pub owner_user_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub is_public: bool,
    /// Opaque token for public read-only access.
    pub share_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct ListMovie {
    pub list_id: Uuid,
    pub movie_id: Uuid,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
}

/// List entry joined with its movie for detail screens.
#[derive(Debug, Serialize, FromRow)]
pub struct ListMovieDetail {
    pub movie_id: Uuid,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub poster_url: Option<String>,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    pub added_by: Uuid,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: String,
    pub description: Option<String>,
    pub owner_user_id: Option<Uuid>,
    pub owner_group_id: Option<Uuid>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PatchListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl PatchListRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.is_public.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct AddListMovieRequest {
    pub movie_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ListWithMovies {
    pub list: List,
    pub movies: Vec<ListMovieDetail>,
}

const LIST_COLUMNS: &str = "list_id, name, description, owner_user_id, owner_group_id, \
     is_public, share_id, created_at, updated_at";

impl List {
    pub async fn create(
        pool: &PgPool,
        name: &str,
        description: Option<&str>,
        owner_user_id: Option<Uuid>,
        owner_group_id: Option<Uuid>,
        is_public: bool,
        share_id: &str,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO lists (list_id, name, description, owner_user_id, owner_group_id,
                                is_public, share_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
             RETURNING {LIST_COLUMNS}"
        );
        sqlx::query_as::<_, List>(&sql)
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(description)
            .bind(owner_user_id)
            .bind(owner_group_id)
            .bind(is_public)
            .bind(share_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, list_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM lists WHERE list_id = $1");
        sqlx::query_as::<_, List>(&sql)
            .bind(list_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_share_id(
        pool: &PgPool,
        share_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {LIST_COLUMNS} FROM lists WHERE share_id = $1");
        sqlx::query_as::<_, List>(&sql)
            .bind(share_id)
            .fetch_optional(pool)
            .await
    }

    /// Own lists plus the lists of groups the user belongs to.
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let sql = format!(
            "SELECT {LIST_COLUMNS} FROM lists
             WHERE owner_user_id = $1
                OR owner_group_id IN (SELECT group_id FROM group_members WHERE user_id = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, List>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Partial update over the patchable field set; `Ok(None)` for an empty
    /// request, without touching the database.
    pub async fn merge(
        pool: &PgPool,
        list_id: Uuid,
        req: &PatchListRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        if req.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "UPDATE lists
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 is_public = COALESCE($4, is_public),
                 updated_at = NOW()
             WHERE list_id = $1
             RETURNING {LIST_COLUMNS}"
        );
        sqlx::query_as::<_, List>(&sql)
            .bind(list_id)
            .bind(req.name.as_deref())
            .bind(req.description.as_deref())
            .bind(req.is_public)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, list_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lists WHERE list_id = $1")
            .bind(list_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Whether the requester may mutate this list: its owning user, or any
    /// member of its owning group.
    pub async fn can_modify(&self, pool: &PgPool, user_id: Uuid) -> Result<bool, sqlx::Error> {
        if self.owner_user_id == Some(user_id) {
            return Ok(true);
        }
        match self.owner_group_id {
            Some(group_id) => GroupMember::is_member(pool, group_id, user_id).await,
            None => Ok(false),
        }
    }

    /// Insert-or-ignore; `None` means the movie was already on the list.
    pub async fn add_movie(
        pool: &PgPool,
        list_id: Uuid,
        movie_id: Uuid,
        added_by: Uuid,
    ) -> Result<Option<ListMovie>, sqlx::Error> {
        sqlx::query_as::<_, ListMovie>(
            "INSERT INTO list_movies (list_id, movie_id, added_by, added_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (list_id, movie_id) DO NOTHING
             RETURNING list_id, movie_id, added_by, added_at",
        )
        .bind(list_id)
        .bind(movie_id)
        .bind(added_by)
        .fetch_optional(pool)
        .await
    }

    pub async fn remove_movie(
        pool: &PgPool,
        list_id: Uuid,
        movie_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM list_movies WHERE list_id = $1 AND movie_id = $2")
            .bind(list_id)
            .bind(movie_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn movies(pool: &PgPool, list_id: Uuid) -> Result<Vec<ListMovieDetail>, sqlx::Error> {
        sqlx::query_as::<_, ListMovieDetail>(
            "SELECT m.movie_id, m.title, m.year, m.genre, m.poster_url,
                    m.rating_avg, m.rating_count, lm.added_by, lm.added_at
             FROM list_movies lm
             JOIN movies m ON lm.movie_id = m.movie_id
             WHERE lm.list_id = $1
             ORDER BY lm.added_at DESC",
        )
        .bind(list_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_patch_is_detected() {
        let req = PatchListRequest {
            name: None,
            description: None,
            is_public: None,
        };
        assert!(req.is_empty());

        let req = PatchListRequest {
            is_public: Some(true),
            ..req
        };
        assert!(!req.is_empty());
    }
}
