use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::routes::group::model::{GroupMember, ROLE_MEMBER};

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";
pub const STATUS_DECLINED: &str = "declined";

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct GroupInvitation {
    pub invitation_id: Uuid,
    pub group_id: Uuid,
    pub invitee_id: Uuid,
    pub inviter_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// Invitation joined with group and inviter names for inbox screens.
#[derive(Debug, Serialize, FromRow)]
pub struct InvitationInfo {
    pub invitation_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub invitee_id: Uuid,
    pub invitee_username: String,
    pub inviter_id: Uuid,
    pub inviter_username: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct JoinRequest {
    pub request_id: Uuid,
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct JoinRequestInfo {
    pub request_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub user_id: Uuid,
    pub username: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateInvitationRequest {
    pub user_id: Uuid,
}

const INVITATION_COLUMNS: &str =
    "invitation_id, group_id, invitee_id, inviter_id, status, created_at, responded_at";

const REQUEST_COLUMNS: &str =
    "request_id, group_id, user_id, status, created_at, responded_at";

impl GroupInvitation {
    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }

    pub async fn create(
        pool: &PgPool,
        group_id: Uuid,
        invitee_id: Uuid,
        inviter_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO group_invitations
                 (invitation_id, group_id, invitee_id, inviter_id, status, created_at)
             VALUES ($1, $2, $3, $4, '{STATUS_PENDING}', NOW())
             RETURNING {INVITATION_COLUMNS}"
        );
        sqlx::query_as::<_, GroupInvitation>(&sql)
            .bind(Uuid::new_v4())
            .bind(group_id)
            .bind(invitee_id)
            .bind(inviter_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        invitation_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let sql =
            format!("SELECT {INVITATION_COLUMNS} FROM group_invitations WHERE invitation_id = $1");
        sqlx::query_as::<_, GroupInvitation>(&sql)
            .bind(invitation_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn has_pending(
        pool: &PgPool,
        group_id: Uuid,
        invitee_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM group_invitations
                 WHERE group_id = $1 AND invitee_id = $2 AND status = 'pending'
             )",
        )
        .bind(group_id)
        .bind(invitee_id)
        .fetch_one(pool)
        .await
    }

    pub async fn pending_for_user(
        pool: &PgPool,
        invitee_id: Uuid,
    ) -> Result<Vec<InvitationInfo>, sqlx::Error> {
        sqlx::query_as::<_, InvitationInfo>(
            "SELECT i.invitation_id, i.group_id, g.name AS group_name,
                    i.invitee_id, e.username AS invitee_username,
                    i.inviter_id, u.username AS inviter_username,
                    i.status, i.created_at
             FROM group_invitations i
             JOIN groups g ON i.group_id = g.group_id
             JOIN users u ON i.inviter_id = u.user_id
             JOIN users e ON i.invitee_id = e.user_id
             WHERE i.invitee_id = $1 AND i.status = 'pending'
             ORDER BY i.created_at DESC",
        )
        .bind(invitee_id)
        .fetch_all(pool)
        .await
    }

    pub async fn pending_for_group(
        pool: &PgPool,
        group_id: Uuid,
    ) -> Result<Vec<InvitationInfo>, sqlx::Error> {
        sqlx::query_as::<_, InvitationInfo>(
            "SELECT i.invitation_id, i.group_id, g.name AS group_name,
                    i.invitee_id, e.username AS invitee_username,
                    i.inviter_id, u.username AS inviter_username,
                    i.status, i.created_at
             FROM group_invitations i
             JOIN groups g ON i.group_id = g.group_id
             JOIN users u ON i.inviter_id = u.user_id
             JOIN users e ON i.invitee_id = e.user_id
             WHERE i.group_id = $1 AND i.status = 'pending'
             ORDER BY i.created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    /// Accepts a pending invitation: status flip, membership insert and
    /// counterpart join-request cancellation run in one transaction. Returns
    /// false when the invitation was no longer pending.
    pub async fn accept(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE group_invitations
             SET status = 'accepted', responded_at = NOW()
             WHERE invitation_id = $1 AND status = 'pending'",
        )
        .bind(self.invitation_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        GroupMember::add(&mut tx, self.group_id, self.invitee_id, ROLE_MEMBER).await?;

        // a join request for the same pair would now be meaningless
        sqlx::query(
            "UPDATE join_requests
             SET status = 'declined', responded_at = NOW()
             WHERE group_id = $1 AND user_id = $2 AND status = 'pending'",
        )
        .bind(self.group_id)
        .bind(self.invitee_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Status update only, no side effects. Returns false when the
    /// invitation was no longer pending.
    pub async fn decline(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE group_invitations
             SET status = 'declined', responded_at = NOW()
             WHERE invitation_id = $1 AND status = 'pending'",
        )
        .bind(self.invitation_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl JoinRequest {
    pub async fn create(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        let sql = format!(
            "INSERT INTO join_requests (request_id, group_id, user_id, status, created_at)
             VALUES ($1, $2, $3, '{STATUS_PENDING}', NOW())
             RETURNING {REQUEST_COLUMNS}"
        );
        sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(Uuid::new_v4())
            .bind(group_id)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, request_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM join_requests WHERE request_id = $1");
        sqlx::query_as::<_, JoinRequest>(&sql)
            .bind(request_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn has_pending(
        pool: &PgPool,
        group_id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(
                 SELECT 1 FROM join_requests
                 WHERE group_id = $1 AND user_id = $2 AND status = 'pending'
             )",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn pending_for_group(
        pool: &PgPool,
        group_id: Uuid,
    ) -> Result<Vec<JoinRequestInfo>, sqlx::Error> {
        sqlx::query_as::<_, JoinRequestInfo>(
            "SELECT r.request_id, r.group_id, g.name AS group_name,
                    r.user_id, u.username, r.status, r.created_at
             FROM join_requests r
             JOIN groups g ON r.group_id = g.group_id
             JOIN users u ON r.user_id = u.user_id
             WHERE r.group_id = $1 AND r.status = 'pending'
             ORDER BY r.created_at DESC",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await
    }

    /// Accepts a pending join request: status flip, membership insert and
    /// counterpart invitation cancellation run in one transaction. Returns
    /// false when the request was no longer pending.
    pub async fn accept(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE join_requests
             SET status = 'accepted', responded_at = NOW()
             WHERE request_id = $1 AND status = 'pending'",
        )
        .bind(self.request_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        GroupMember::add(&mut tx, self.group_id, self.user_id, ROLE_MEMBER).await?;

        // a pending invitation for the same pair would now be meaningless
        sqlx::query(
            "UPDATE group_invitations
             SET status = 'declined', responded_at = NOW()
             WHERE group_id = $1 AND invitee_id = $2 AND status = 'pending'",
        )
        .bind(self.group_id)
        .bind(self.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(true)
    }

    /// Status update only, no side effects. Returns false when the request
    /// was no longer pending.
    pub async fn decline(&self, pool: &PgPool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE join_requests
             SET status = 'declined', responded_at = NOW()
             WHERE request_id = $1 AND status = 'pending'",
        )
        .bind(self.request_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn is_pending(&self) -> bool {
        self.status == STATUS_PENDING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_predicate() {
        let invitation = GroupInvitation {
            invitation_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            invitee_id: Uuid::new_v4(),
            inviter_id: Uuid::new_v4(),
            status: STATUS_PENDING.into(),
            created_at: Utc::now(),
            responded_at: None,
        };
        assert!(invitation.is_pending());

        let handled = GroupInvitation {
            status: STATUS_ACCEPTED.into(),
            ..invitation
        };
        assert!(!handled.is_pending());

        let request = JoinRequest {
            request_id: Uuid::new_v4(),
            group_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            status: STATUS_DECLINED.into(),
            created_at: Utc::now(),
            responded_at: None,
        };
        assert!(!request.is_pending());
    }
}
