use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_MEMBER: &str = "member";

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct Group {
    pub group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Directory/detail shape with the live member count.
#[derive(Debug, Serialize, FromRow)]
pub struct GroupInfo {
    pub group_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub owner_id: Uuid,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct MemberInfo {
    pub user_id: Uuid,
    pub username: String,
    pub avatar_url: Option<String>,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct GroupFavourite {
    pub group_id: Uuid,
    pub movie_id: Uuid,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct GroupFavouriteMovie {
    pub movie_id: Uuid,
    pub title: String,
    pub year: i32,
    pub genre: String,
    pub poster_url: Option<String>,
    pub rating_avg: Option<f64>,
    pub rating_count: i64,
    pub added_by: Uuid,
    pub added_by_username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PatchGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

impl PatchGroupRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.avatar_url.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct TransferOwnershipRequest {
    pub new_owner_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct AddGroupFavouriteRequest {
    pub movie_id: Uuid,
}

const GROUP_COLUMNS: &str =
    "group_id, name, description, avatar_url, owner_id, created_at, updated_at";

const GROUP_INFO_COLUMNS: &str = "g.group_id, g.name, g.description, g.avatar_url, g.owner_id,
     (SELECT COUNT(*) FROM group_members gm WHERE gm.group_id = g.group_id) AS member_count,
     g.created_at";

impl Group {
    /// Creates the group and the owner's membership row in one transaction.
    pub async fn create(
        pool: &PgPool,
        req: &CreateGroupRequest,
        owner_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let sql = format!(
            "INSERT INTO groups (group_id, name, description, avatar_url, owner_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
             RETURNING {GROUP_COLUMNS}"
        );
        let group = sqlx::query_as::<_, Group>(&sql)
            .bind(Uuid::new_v4())
            .bind(&req.name)
            .bind(req.description.as_deref())
            .bind(req.avatar_url.as_deref())
            .bind(owner_id)
            .fetch_one(&mut *tx)
            .await?;

        GroupMember::add(&mut tx, group.group_id, owner_id, ROLE_OWNER).await?;

        tx.commit().await?;

        Ok(group)
    }

    pub async fn find_by_id(pool: &PgPool, group_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {GROUP_COLUMNS} FROM groups WHERE group_id = $1");
        sqlx::query_as::<_, Group>(&sql)
            .bind(group_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn info(pool: &PgPool, group_id: Uuid) -> Result<Option<GroupInfo>, sqlx::Error> {
        let sql =
            format!("SELECT {GROUP_INFO_COLUMNS} FROM groups g WHERE g.group_id = $1");
        sqlx::query_as::<_, GroupInfo>(&sql)
            .bind(group_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<GroupInfo>, sqlx::Error> {
        let sql = format!(
            "SELECT {GROUP_INFO_COLUMNS} FROM groups g
             ORDER BY g.created_at DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, GroupInfo>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Partial update over the patchable field set; `Ok(None)` for an empty
    /// request, without touching the database.
    pub async fn merge(
        pool: &PgPool,
        group_id: Uuid,
        req: &PatchGroupRequest,
    ) -> Result<Option<Self>, sqlx::Error> {
        if req.is_empty() {
            return Ok(None);
        }

        let sql = format!(
            "UPDATE groups
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 avatar_url = COALESCE($4, avatar_url),
                 updated_at = NOW()
             WHERE group_id = $1
             RETURNING {GROUP_COLUMNS}"
        );
        sqlx::query_as::<_, Group>(&sql)
            .bind(group_id)
            .bind(req.name.as_deref())
            .bind(req.description.as_deref())
            .bind(req.avatar_url.as_deref())
            .fetch_optional(pool)
            .await
    }

    /// Members, invitations, requests, favourites, comments and group-owned
    /// lists cascade in the schema.
    pub async fn delete(pool: &PgPool, group_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM groups WHERE group_id = $1")
            .bind(group_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Moves ownership to an existing member: the groups row and both
    /// membership roles change together.
    pub async fn transfer_ownership(
        pool: &PgPool,
        group_id: Uuid,
        old_owner_id: Uuid,
        new_owner_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("UPDATE groups SET owner_id = $2, updated_at = NOW() WHERE group_id = $1")
            .bind(group_id)
            .bind(new_owner_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE group_members SET role = $3 WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(old_owner_id)
            .bind(ROLE_MEMBER)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE group_members SET role = $3 WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(new_owner_id)
            .bind(ROLE_OWNER)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

pub struct GroupMember;

impl GroupMember {
    /// The membership predicate behind every group-scoped permission check.
    pub async fn is_member(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM group_members WHERE group_id = $1 AND user_id = $2)",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Insert-or-ignore so concurrent joins through different paths stay
    /// idempotent.
    pub async fn add(
        tx: &mut Transaction<'_, Postgres>,
        group_id: Uuid,
        user_id: Uuid,
        role: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO group_members (group_id, user_id, role, joined_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (group_id, user_id) DO NOTHING",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(role)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn remove(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM group_members WHERE group_id = $1 AND user_id = $2")
            .bind(group_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(pool: &PgPool, group_id: Uuid) -> Result<Vec<MemberInfo>, sqlx::Error> {
        sqlx::query_as::<_, MemberInfo>(
            "SELECT gm.user_id, u.username, u.avatar_url, gm.role, gm.joined_at
             FROM group_members gm
             JOIN users u ON gm.user_id = u.user_id
             WHERE gm.group_id = $1
             ORDER BY gm.joined_at ASC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }
}

impl GroupFavourite {
    /// Insert-or-ignore; `None` means the movie was already favourited by
    /// the group.
    pub async fn add(
        pool: &PgPool,
        group_id: Uuid,
        movie_id: Uuid,
        added_by: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, GroupFavourite>(
            "INSERT INTO group_favourites (group_id, movie_id, added_by, created_at)
             VALUES ($1, $2, $3, NOW())
             ON CONFLICT (group_id, movie_id) DO NOTHING
             RETURNING group_id, movie_id, added_by, created_at",
        )
        .bind(group_id)
        .bind(movie_id)
        .bind(added_by)
        .fetch_optional(pool)
        .await
    }

    pub async fn find(
        pool: &PgPool,
        group_id: Uuid,
        movie_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, GroupFavourite>(
            "SELECT group_id, movie_id, added_by, created_at
             FROM group_favourites
             WHERE group_id = $1 AND movie_id = $2",
        )
        .bind(group_id)
        .bind(movie_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn remove(
        pool: &PgPool,
        group_id: Uuid,
        movie_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM group_favourites WHERE group_id = $1 AND movie_id = $2")
                .bind(group_id)
                .bind(movie_id)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list(
        pool: &PgPool,
        group_id: Uuid,
    ) -> Result<Vec<GroupFavouriteMovie>, sqlx::Error> {
        sqlx::query_as::<_, GroupFavouriteMovie>(
            "SELECT m.movie_id, m.title, m.year, m.genre, m.poster_url,
                    m.rating_avg, m.rating_count,
                    gf.added_by, u.username AS added_by_username, gf.created_at
             FROM group_favourites gf
             JOIN movies m ON gf.movie_id = m.movie_id
             JOIN users u ON gf.added_by = u.user_id
             WHERE gf.group_id = $1
             ORDER BY gf.created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }
}
