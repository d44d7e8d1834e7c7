use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    AppState,
    routes::group::model::{Group, GroupMember},
    routes::user::model::User,
    utils::{Claims, error_codes, error_to_api_response, success_to_api_response},
};

use super::model::{CreateInvitationRequest, GroupInvitation, JoinRequest};

/// Loads the group or produces the 404/500 response.
async fn load_group<T>(
    state: &AppState,
    group_id: Uuid,
) -> Result<Group, (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    match Group::find_by_id(&state.pool, group_id).await {
        Ok(Some(group)) => Ok(group),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Group not found".into()),
        )),
        Err(e) => {
            tracing::error!("Failed to fetch group {}: {:?}", group_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to fetch group".into()),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn invite_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
    Json(req): Json<CreateInvitationRequest>,
) -> impl IntoResponse {
    if let Err(resp) = load_group(&state, group_id).await {
        return resp;
    }

    match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::FORBIDDEN,
                error_to_api_response(
                    error_codes::PERMISSION_DENIED,
                    "You are not a member of this group".into(),
                ),
            );
        }
        Err(e) => {
            tracing::error!("Failed to check membership: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to invite user".into()),
            );
        }
    }

    match User::find_by_id(&state.pool, req.user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "User not found".into()),
            );
        }
        Err(e) => {
            tracing::error!("Failed to fetch user {}: {:?}", req.user_id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to invite user".into()),
            );
        }
    }

    match GroupMember::is_member(&state.pool, group_id, req.user_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::CONFLICT,
                    "User is already a member of this group".into(),
                ),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check membership: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to invite user".into()),
            );
        }
    }

    match GroupInvitation::has_pending(&state.pool, group_id, req.user_id).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::CONFLICT,
                    "An invitation is already pending for this user".into(),
                ),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check pending invitations: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to invite user".into()),
            );
        }
    }

    match GroupInvitation::create(&state.pool, group_id, req.user_id, claims.sub).await {
        Ok(invitation) => (StatusCode::CREATED, success_to_api_response(invitation)),
        // unique partial index backstop for the check-then-insert race
        Err(e)
            if e.as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false) =>
        {
            (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::CONFLICT,
                    "An invitation is already pending for this user".into(),
                ),
            )
        }
        Err(e) => {
            tracing::error!("Failed to create invitation: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(error_codes::INTERNAL_ERROR, "Failed to invite user".into()),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn my_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> impl IntoResponse {
    match GroupInvitation::pending_for_user(&state.pool, claims.sub).await {
        Ok(invitations) => (StatusCode::OK, success_to_api_response(invitations)),
        Err(e) => {
            tracing::error!("Failed to list invitations for {}: {:?}", claims.sub, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch invitations".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn group_invitations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can view group invitations".into(),
            ),
        );
    }

    match GroupInvitation::pending_for_group(&state.pool, group_id).await {
        Ok(invitations) => (StatusCode::OK, success_to_api_response(invitations)),
        Err(e) => {
            tracing::error!("Failed to list invitations for group {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch invitations".into(),
                ),
            )
        }
    }
}

async fn load_invitation<T>(
    state: &AppState,
    invitation_id: Uuid,
) -> Result<GroupInvitation, (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    match GroupInvitation::find_by_id(&state.pool, invitation_id).await {
        Ok(Some(invitation)) => Ok(invitation),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            error_to_api_response(error_codes::NOT_FOUND, "Invitation not found".into()),
        )),
        Err(e) => {
            tracing::error!("Failed to fetch invitation {}: {:?}", invitation_id, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch invitation".into(),
                ),
            ))
        }
    }
}

#[axum::debug_handler]
pub async fn accept_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(invitation_id): Path<Uuid>,
) -> impl IntoResponse {
    let invitation = match load_invitation(&state, invitation_id).await {
        Ok(invitation) => invitation,
        Err(resp) => return resp,
    };

    if invitation.invitee_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the invited user can respond to this invitation".into(),
            ),
        );
    }

    if !invitation.is_pending() {
        return (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Invitation has already been handled".into(),
            ),
        );
    }

    match invitation.accept(&state.pool).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "group_id": invitation.group_id })),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Invitation has already been handled".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to accept invitation {}: {:?}", invitation_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to accept invitation".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn decline_invitation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(invitation_id): Path<Uuid>,
) -> impl IntoResponse {
    let invitation = match load_invitation(&state, invitation_id).await {
        Ok(invitation) => invitation,
        Err(resp) => return resp,
    };

    if invitation.invitee_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the invited user can respond to this invitation".into(),
            ),
        );
    }

    match invitation.decline(&state.pool).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "declined": true })),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Invitation has already been handled".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to decline invitation {}: {:?}", invitation_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to decline invitation".into(),
                ),
            )
        }
    }
}

/// A non-member asks to join; the owner decides later.
#[axum::debug_handler]
pub async fn join_group(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    if let Err(resp) = load_group(&state, group_id).await {
        return resp;
    }

    match GroupMember::is_member(&state.pool, group_id, claims.sub).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::CONFLICT,
                    "You are already a member of this group".into(),
                ),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check membership: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to send join request".into(),
                ),
            );
        }
    }

    match JoinRequest::has_pending(&state.pool, group_id, claims.sub).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                error_to_api_response(
                    error_codes::CONFLICT,
                    "A join request is already pending".into(),
                ),
            );
        }
        Ok(false) => {}
        Err(e) => {
            tracing::error!("Failed to check pending join requests: {:?}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to send join request".into(),
                ),
            );
        }
    }

    match JoinRequest::create(&state.pool, group_id, claims.sub).await {
        Ok(request) => (StatusCode::OK, success_to_api_response(request)),
        Err(e) => {
            tracing::error!("Failed to create join request: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to send join request".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn group_join_requests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(group_id): Path<Uuid>,
) -> impl IntoResponse {
    let group = match load_group(&state, group_id).await {
        Ok(group) => group,
        Err(resp) => return resp,
    };

    if group.owner_id != claims.sub {
        return (
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can view join requests".into(),
            ),
        );
    }

    match JoinRequest::pending_for_group(&state.pool, group_id).await {
        Ok(requests) => (StatusCode::OK, success_to_api_response(requests)),
        Err(e) => {
            tracing::error!("Failed to list join requests for {}: {:?}", group_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch join requests".into(),
                ),
            )
        }
    }
}

async fn load_request_for_owner<T>(
    state: &AppState,
    request_id: Uuid,
    requester: Uuid,
) -> Result<JoinRequest, (StatusCode, axum::Json<crate::utils::ApiResponse<T>>)> {
    let request = match JoinRequest::find_by_id(&state.pool, request_id).await {
        Ok(Some(request)) => request,
        Ok(None) => {
            return Err((
                StatusCode::NOT_FOUND,
                error_to_api_response(error_codes::NOT_FOUND, "Join request not found".into()),
            ));
        }
        Err(e) => {
            tracing::error!("Failed to fetch join request {}: {:?}", request_id, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to fetch join request".into(),
                ),
            ));
        }
    };

    let group = load_group(state, request.group_id).await?;

    if group.owner_id != requester {
        return Err((
            StatusCode::FORBIDDEN,
            error_to_api_response(
                error_codes::PERMISSION_DENIED,
                "Only the group owner can respond to join requests".into(),
            ),
        ));
    }

    Ok(request)
}

#[axum::debug_handler]
pub async fn accept_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> impl IntoResponse {
    let request = match load_request_for_owner(&state, request_id, claims.sub).await {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    if !request.is_pending() {
        return (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Join request has already been handled".into(),
            ),
        );
    }

    match request.accept(&state.pool).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "user_id": request.user_id })),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Join request has already been handled".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to accept join request {}: {:?}", request_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to accept join request".into(),
                ),
            )
        }
    }
}

#[axum::debug_handler]
pub async fn decline_join_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
) -> impl IntoResponse {
    let request = match load_request_for_owner(&state, request_id, claims.sub).await {
        Ok(request) => request,
        Err(resp) => return resp,
    };

    match request.decline(&state.pool).await {
        Ok(true) => (
            StatusCode::OK,
            success_to_api_response(serde_json::json!({ "declined": true })),
        ),
        Ok(false) => (
            StatusCode::CONFLICT,
            error_to_api_response(
                error_codes::CONFLICT,
                "Join request has already been handled".into(),
            ),
        ),
        Err(e) => {
            tracing::error!("Failed to decline join request {}: {:?}", request_id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_to_api_response(
                    error_codes::INTERNAL_ERROR,
                    "Failed to decline join request".into(),
                ),
            )
        }
    }
}
