/// Invitation endpoints
///
/// Issuing, listing and cancelling invitations are organisation-scoped
/// and require a session bound to that organisation. Redemption is
/// public: possession of the code is the credential.
///
/// # Endpoints
///
/// ```text
/// POST   /organisations/:organisation_id/invitations           # issue
/// GET    /organisations/:organisation_id/invitations           # list pending
/// DELETE /organisations/:organisation_id/invitations/:user_id  # cancel
/// POST   /users/accept-invitation                              # redeem (public)
/// ```
///
/// # Issue flow
///
/// ```text
/// find-or-create user by email
///   └── reject if a live membership already links the pair (409)
///         └── create membership (invited)
///               └── store code → membership_id with TTL
///                     └── enqueue invitation email (best effort)
/// ```

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use orghub_shared::auth::context::AuthContext;
use orghub_shared::auth::jwt::{create_session_token, Claims};
use orghub_shared::email::{EmailJob, EmailTemplate};
use orghub_shared::error::MembershipError;
use orghub_shared::models::activity::ActivityKind;
use orghub_shared::models::membership::{
    CreateMembership, Membership, MembershipRole, MembershipStatus,
};
use orghub_shared::models::organisation::Organisation;
use orghub_shared::models::user::{CreateUser, User, UserStatus};

use crate::app::AppState;
use crate::audit;
use crate::error::{ApiError, ApiResult};

/// Request body for issuing an invitation
#[derive(Debug, Deserialize, Validate)]
pub struct InvitationRequest {
    /// Salutation, e.g. "Mr" or "Ms"
    pub title: Option<String>,

    /// Email address of the invitee
    #[validate(email(message = "Email is invalid"))]
    pub email: String,

    /// First name of the invitee
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Last name of the invitee
    #[validate(length(min = 1, max = 255, message = "Last name is required"))]
    pub last_name: String,

    /// Phone country code, e.g. "+41"
    pub phone_country_code: Option<String>,

    /// Phone number without country code
    pub phone_number: Option<String>,
}

/// Response body for a successfully issued invitation
#[derive(Debug, Serialize, Deserialize)]
pub struct InvitationResponse {
    /// ID of the invited user (found or created)
    #[serde(rename = "uuid")]
    pub user_id: Uuid,

    /// Raw invitation code, returned outside production only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Request body for redeeming an invitation
///
/// The code is optional at the deserialization level so a missing key
/// produces the same structured error as an empty one.
#[derive(Debug, Serialize, Deserialize)]
pub struct AcceptInvitationRequest {
    /// Invitation code from the accept link
    pub invitation_id: Option<String>,
}

/// Session issued on successful redemption
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Signed session token bound to the joined organisation
    pub jwt: String,
}

struct Redemption {
    user_id: Uuid,
    session: SessionResponse,
}

/// `POST /organisations/:organisation_id/invitations`
pub async fn send_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(organisation_id): Path<Uuid>,
    Json(req): Json<InvitationRequest>,
) -> ApiResult<Json<InvitationResponse>> {
    let outcome = issue_invitation(&state, &auth, organisation_id, req).await;
    audit::record(
        &state,
        ActivityKind::CreateInvitation,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(Json)
}

async fn issue_invitation(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
    req: InvitationRequest,
) -> ApiResult<InvitationResponse> {
    req.validate()?;

    if auth.organisation_id != organisation_id {
        return Err(ApiError::Forbidden(
            "No access rights for the organisation".to_string(),
        ));
    }

    let organisation = Organisation::find(&state.db, organisation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Organisation not found".to_string()))?;

    let inviter = User::find(&state.db, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inviter not found".to_string()))?;

    // Inviting an address that has no account yet creates one on the
    // spot; the account stays unverified until the invitation is
    // redeemed.
    let invitee = match User::find_by_email(&state.db, &req.email).await? {
        Some(user) => user,
        None => {
            User::create(
                &state.db,
                CreateUser {
                    email: req.email.clone(),
                    name: Some(req.name.clone()),
                    last_name: Some(req.last_name.clone()),
                    phone_country_code: req.phone_country_code.clone(),
                    phone_number: req.phone_number.clone(),
                },
            )
            .await?
        }
    };

    // A live membership, pending or active, blocks a second invitation.
    if Membership::find(&state.db, organisation_id, invitee.id)
        .await?
        .is_some()
    {
        return Err(MembershipError::AlreadyExists(
            "Invitation already exists".to_string(),
        )
        .into());
    }

    let membership = Membership::create(
        &state.db,
        CreateMembership {
            organisation_id,
            user_id: invitee.id,
            role: MembershipRole::User,
            status: MembershipStatus::Invited,
            is_home: false,
        },
    )
    .await?;

    // A code-store failure after this point leaves a pending membership
    // without a code; the sweeper reclaims it after the retention
    // window.
    let code = state.codes.issue(membership.id).await?;

    let inviter_name = match (&inviter.name, &inviter.last_name) {
        (Some(name), Some(last_name)) => format!("{} {}", name, last_name),
        (Some(name), None) => name.clone(),
        _ => inviter.email.clone(),
    };

    let mut variables = HashMap::new();
    variables.insert("ACCEPT_URL".to_string(), state.config.accept_url(&code));
    if let Some(title) = req.title {
        variables.insert("INVITEE_TITLE".to_string(), title);
    }
    variables.insert("INVITEE_FIRST_NAME".to_string(), req.name);
    variables.insert("INVITER_NAME".to_string(), inviter_name);
    variables.insert(
        "INVITER_ORGANISATION".to_string(),
        organisation
            .display_name
            .clone()
            .unwrap_or_else(|| organisation.name.clone()),
    );

    state.mailer.enqueue(EmailJob {
        template: EmailTemplate::Invitation,
        recipient: invitee.email.clone(),
        variables,
    });

    tracing::info!(
        organisation_id = %organisation_id,
        user_id = %invitee.id,
        "Invitation issued"
    );

    // Outside production the raw code is echoed back so tests can
    // redeem without email access.
    let echo_code = (!state.config.api.environment.is_production()).then_some(code);

    Ok(InvitationResponse {
        user_id: invitee.id,
        code: echo_code,
    })
}

/// `GET /organisations/:organisation_id/invitations`
pub async fn list_invitations(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(organisation_id): Path<Uuid>,
) -> ApiResult<Json<Vec<User>>> {
    let outcome = pending_invitations(&state, &auth, organisation_id).await;
    audit::record(
        &state,
        ActivityKind::GetInvitations,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(Json)
}

async fn pending_invitations(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
) -> ApiResult<Vec<User>> {
    if auth.organisation_id != organisation_id {
        return Err(ApiError::Forbidden(
            "No access rights for the organisation".to_string(),
        ));
    }

    let users = User::list_for_organisation(&state.db, organisation_id, true).await?;
    Ok(users)
}

/// `DELETE /organisations/:organisation_id/invitations/:user_id`
pub async fn cancel_invitation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((organisation_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let outcome = revoke_invitation(&state, &auth, organisation_id, user_id).await;
    audit::record(
        &state,
        ActivityKind::DeleteInvitation,
        Some(auth.user_id),
        &outcome,
    );
    outcome.map(|_| StatusCode::NO_CONTENT)
}

async fn revoke_invitation(
    state: &AppState,
    auth: &AuthContext,
    organisation_id: Uuid,
    user_id: Uuid,
) -> ApiResult<()> {
    if auth.organisation_id != organisation_id {
        return Err(ApiError::Forbidden(
            "No access rights for the organisation".to_string(),
        ));
    }

    let membership = Membership::find(&state.db, organisation_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation not found".to_string()))?;

    // Cancellation only covers pending invitations; removing an active
    // member goes through the member endpoints and their permission
    // checks.
    if membership.status != MembershipStatus::Invited {
        return Err(MembershipError::invalid_field("user_id", "User already active").into());
    }

    Membership::soft_delete(&state.db, membership.id).await?;

    tracing::info!(
        organisation_id = %organisation_id,
        user_id = %user_id,
        "Invitation cancelled"
    );

    Ok(())
}

/// `POST /users/accept-invitation`
pub async fn accept_invitation(
    State(state): State<AppState>,
    Json(req): Json<AcceptInvitationRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let outcome = redeem_invitation(&state, req).await;
    let user_id = outcome.as_ref().ok().map(|r| r.user_id);
    audit::record(&state, ActivityKind::AcceptInvitation, user_id, &outcome);
    outcome.map(|r| Json(r.session))
}

async fn redeem_invitation(
    state: &AppState,
    req: AcceptInvitationRequest,
) -> ApiResult<Redemption> {
    let code = req.invitation_id.as_deref().unwrap_or("").trim();
    if code.is_empty() {
        return Err(
            MembershipError::invalid_field("invitation_id", "InvitationID is invalid").into(),
        );
    }

    // Unknown, expired and unreadable codes all collapse into one
    // response so the endpoint can't be used as a code oracle.
    let membership_id = match state.codes.lookup(code).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            return Err(ApiError::NotFound(
                "Invitation is invalid or expired".to_string(),
            ));
        }
        Err(e) => {
            tracing::error!("Invitation code lookup failed: {}", e);
            return Err(ApiError::NotFound(
                "Invitation is invalid or expired".to_string(),
            ));
        }
    };

    let membership = Membership::find_by_id(&state.db, membership_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation is invalid or expired".to_string()))?;

    // The code outlives redemption in the store; this status check is
    // the single-use guard.
    if membership.status != MembershipStatus::Invited {
        return Err(MembershipError::AlreadyAccepted.into());
    }

    let user = User::find(&state.db, membership.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    // Redeeming proves control of the invited mailbox.
    if user.status == UserStatus::Unverified {
        User::mark_verified(&state.db, user.id).await?;
    }

    Membership::update_status(&state.db, membership.id, MembershipStatus::Active)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invitation is invalid or expired".to_string()))?;

    let claims = Claims::new(user.id, membership.organisation_id);
    let token = create_session_token(&claims, state.jwt_secret())?;

    tracing::info!(
        organisation_id = %membership.organisation_id,
        user_id = %user.id,
        "Invitation redeemed"
    );

    Ok(Redemption {
        user_id: user.id,
        session: SessionResponse { jwt: token },
    })
}
