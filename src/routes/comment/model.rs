use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub comment_id: Uuid,
    pub user_id: Uuid,
    /// Exactly one of the two scope columns is set.
    pub movie_id: Option<Uuid>,
    pub list_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct CommentInfo {
    pub comment_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub movie_id: Option<Uuid>,
    pub list_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct GroupComment {
    pub comment_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct GroupCommentInfo {
    pub comment_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub movie_id: Option<Uuid>,
    pub list_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupCommentRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PatchCommentRequest {
    pub content: Option<String>,
}

impl PatchCommentRequest {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }
}

const COMMENT_COLUMNS: &str =
    "comment_id, user_id, movie_id, list_id, content, created_at, updated_at";

const GROUP_COMMENT_COLUMNS: &str =
    "comment_id, group_id, user_id, content, created_at, updated_at";

impl Comment {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        movie_id: Option<Uuid>,
        list_id: Option<Uuid>,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO comments (comment_id, user_id, movie_id, list_id, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(movie_id)
            .bind(list_id)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = $1");
        sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_movie(
        pool: &PgPool,
        movie_id: Uuid,
    ) -> Result<Vec<CommentInfo>, sqlx::Error> {
        sqlx::query_as::<_, CommentInfo>(
            "SELECT c.comment_id, c.user_id, u.username, c.movie_id, c.list_id,
                    c.content, c.created_at, c.updated_at
             FROM comments c
             JOIN users u ON c.user_id = u.user_id
             WHERE c.movie_id = $1
             ORDER BY c.created_at DESC",
        )
        .bind(movie_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_for_list(
        pool: &PgPool,
        list_id: Uuid,
    ) -> Result<Vec<CommentInfo>, sqlx::Error> {
        sqlx::query_as::<_, CommentInfo>(
            "SELECT c.comment_id, c.user_id, u.username, c.movie_id, c.list_id,
                    c.content, c.created_at, c.updated_at
             FROM comments c
             JOIN users u ON c.user_id = u.user_id
             WHERE c.list_id = $1
             ORDER BY c.created_at DESC",
        )
        .bind(list_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_content(
        pool: &PgPool,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE comments SET content = $2, updated_at = NOW()
             WHERE comment_id = $1
             RETURNING {COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, comment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM comments WHERE comment_id = $1")
            .bind(comment_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl GroupComment {
    pub async fn create(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO group_comments (comment_id, group_id, user_id, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             RETURNING {GROUP_COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, GroupComment>(&sql)
            .bind(Uuid::new_v4())
            .bind(group_id)
            .bind(user_id)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql =
            format!("SELECT {GROUP_COMMENT_COLUMNS} FROM group_comments WHERE comment_id = $1");
        sqlx::query_as::<_, GroupComment>(&sql)
            .bind(comment_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_group(
        pool: &PgPool,
        group_id: Uuid,
    ) -> Result<Vec<GroupCommentInfo>, sqlx::Error> {
        sqlx::query_as::<_, GroupCommentInfo>(
            "SELECT c.comment_id, c.group_id, c.user_id, u.username,
                    c.content, c.created_at, c.updated_at
             FROM group_comments c
             JOIN users u ON c.user_id = u.user_id
             WHERE c.group_id = $1
             ORDER BY c.created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_content(
        pool: &PgPool,
        comment_id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!(
            "UPDATE group_comments SET content = $2, updated_at = NOW()
             WHERE comment_id = $1
             RETURNING {GROUP_COMMENT_COLUMNS}"
        );
        sqlx::query_as::<_, GroupComment>(&sql)
            .bind(comment_id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, comment_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM group_comments WHERE comment_id = $1")
            .bind(comment_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_comment_patch_is_detected() {
        assert!(PatchCommentRequest { content: None }.is_empty());
        assert!(
            !PatchCommentRequest {
                content: Some("edited".into())
            }
            .is_empty()
        );
    }
}
