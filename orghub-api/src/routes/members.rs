/// Organisation member endpoints
///
/// Listing members, adding one directly, changing a member's role and
/// removing a member. All endpoints are organisation-scoped; the
/// session must be bound to the path organisation unless the caller is
/// a platform admin.
///
/// # Endpoints
///
/// ```text
/// GET    /organisations/:organisation_id/users           # list active members
/// POST   /organisations/:organisation_id/users/:user_id  # direct add (platform admin)
/// PATCH  /organisations/:organisation_id/users/:user_id  # change role
/// DELETE /organisations/:organisation_id/users/:user_id  # remove member
/// ```
///
/// # Permission model
///
/// - Platform admins may list, add and remove members of any
///   organisation.
/// - Organisation admins may list members, change roles and remove
///   members of their own organisation, except their own admin
///   membership.
/// - Role changes always go through the admin-floor check in
///   [`orghub_shared::roles`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use orghub_shared::auth::context::AuthContext;
use orghub_shared::error::MembershipError;
use orghub_shared::models::activity::ActivityKind;
use orghub_shared::models::membership::{
    CreateMembership, Membership, MembershipRole, MembershipStatus,
};
use orghub_shared::models::user::User;
use orghub_shared::roles::{check_member_removal, plan_role_change, RoleChange};

use crate::app::AppState;
use crate::audit;
use crate::error::{ApiError, ApiResult};

/// Request body for changing a member's role
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleRequest {
    /// Desired admin flag; `true` promotes, `false` demotes
    pub is_admin: bool,
}

/// `GET /organisations/:organisation_id/users`
pub async fn list_members(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(organisation_id): Path<Uuid>,
) -> ApiResult<Json<Vec<User>>> {
    let outcome = active_members(&state, &auth, organisation_id).await;
    audit::record(
        &state,
        ActivityKind::GetOrganisationUsers,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(Json)
}

async fn active_members(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
) -> ApiResult<Vec<User>> {
    let requester = User::find(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !requester.role.is_global_admin() {
        if auth.organisation_id != organisation_id {
            return Err(ApiError::Forbidden(
                "No access rights for the organisation".to_string(),
            ));
        }

        // The session outlives a removal, so the live membership is
        // re-checked on every listing.
        if Membership::find(&state.db, organisation_id, auth.user_id)
            .await?
            .is_none()
        {
            return Err(ApiError::Forbidden(
                "No access rights for the organisation".to_string(),
            ));
        }
    }

    let users = User::list_for_organisation(&state.db, organisation_id, false).await?;
    Ok(users)
}

/// `POST /organisations/:organisation_id/users/:user_id`
pub async fn add_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((organisation_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let outcome = add_member_directly(&state, &auth, organisation_id, user_id).await;
    audit::record(
        &state,
        ActivityKind::AddOrganisationUser,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(|_| StatusCode::NO_CONTENT)
}

async fn add_member_directly(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    // Direct adds skip the invitation flow entirely and are reserved
    // for platform operators.
    let requester = User::find(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !requester.role.is_global_admin() {
        return Err(ApiError::Forbidden(
            "Only platform admins can add members directly".to_string(),
        ));
    }

    let user = User::find(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if Membership::find(&state.db, organisation_id, user.id)
        .await?
        .is_some()
    {
        return Err(MembershipError::AlreadyExists(
            "User already belongs to the organisation".to_string(),
        )
        .into());
    }

    Membership::create(
        &state.db,
        CreateMembership {
            organisation_id,
            user_id: user.id,
            role: MembershipRole::User,
            status: MembershipStatus::Active,
            is_home: false,
        },
    )
    .await?;

    tracing::info!(
        organisation_id = %organisation_id,
        user_id = %user.id,
        "Member added directly"
    );

    Ok(())
}

/// `PATCH /organisations/:organisation_id/users/:user_id`
pub async fn change_member_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((organisation_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<RoleRequest>,
) -> ApiResult<StatusCode> {
    let outcome = change_role(&state, &auth, organisation_id, user_id, req).await;
    audit::record(
        &state,
        ActivityKind::ChangeOrganisationUser,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(|_| StatusCode::NO_CONTENT)
}

async fn change_role(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
    user_id: Uuid,
    req: RoleRequest,
) -> ApiResult<()> {
    if auth.organisation_id != organisation_id {
        return Err(ApiError::Forbidden(
            "No access rights for the organisation".to_string(),
        ));
    }

    // One snapshot of the live memberships feeds the whole decision:
    // the caller's admin check, the admin floor and the target lookup.
    let memberships = Membership::list_for_organisation(&state.db, organisation_id).await?;

    match plan_role_change(&memberships, auth.user_id, user_id, req.is_admin)? {
        RoleChange::NoOp => {}
        RoleChange::SetRole {
            membership_id,
            role,
        } => {
            Membership::update_role(&state.db, membership_id, role)
                .await?
                .ok_or_else(|| ApiError::NotFound("Membership not found".to_string()))?;

            tracing::info!(
                organisation_id = %organisation_id,
                user_id = %user_id,
                role = ?role,
                "Member role changed"
            );
        }
    }

    Ok(())
}

/// `DELETE /organisations/:organisation_id/users/:user_id`
pub async fn remove_member(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((organisation_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let outcome = remove_member_inner(&state, &auth, organisation_id, user_id).await;
    audit::record(
        &state,
        ActivityKind::DeleteOrganisationUser,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(|_| StatusCode::NO_CONTENT)
}

async fn remove_member_inner(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    let requester = User::find(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !requester.role.is_global_admin() && auth.organisation_id != organisation_id {
        return Err(ApiError::Forbidden(
            "No access rights for the organisation".to_string(),
        ));
    }

    let target = Membership::find(&state.db, organisation_id, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("User doesn't belong to the organisation".to_string())
        })?;

    let requester_membership = Membership::find(&state.db, organisation_id, auth.user_id).await?;

    check_member_removal(
        requester.role.is_global_admin(),
        requester_membership.as_ref(),
        &target,
        auth.user_id,
    )?;

    Membership::soft_delete(&state.db, target.id).await?;

    tracing::info!(
        organisation_id = %organisation_id,
        user_id = %user_id,
        "Member removed"
    );

    Ok(())
}
