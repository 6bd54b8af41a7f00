/// Integration tests for the OrgHub API
///
/// These tests verify the full system works end-to-end:
/// - Invitation issue, listing, cancellation and redemption
/// - Single-use redemption and email verification side effect
/// - Member listing, role changes and the admin floor
/// - Member removal and self-protection
/// - Expired-invitation sweeping
///
/// All tests require a running PostgreSQL and Redis, configured through
/// the usual environment variables, and are ignored by default.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use orghub_shared::models::membership::{Membership, MembershipRole, MembershipStatus};
use orghub_shared::models::user::{User, UserStatus};
use orghub_worker::sweeper::Sweeper;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

async fn call(
    ctx: &TestContext,
    method: &str,
    uri: String,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = ctx.app.clone().call(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

    (status, json)
}

/// Issuing an invitation creates a pending membership and returns the
/// raw code outside production
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_issue_invitation() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("invitee-{}@example.com", Uuid::new_v4());
    let (user_id, code) = common::issue_invitation(&ctx, &email).await.unwrap();

    assert_eq!(code.len(), 32);

    let membership = Membership::find(&ctx.db, ctx.organisation.id, user_id)
        .await
        .unwrap()
        .expect("Membership should exist");
    assert_eq!(membership.status, MembershipStatus::Invited);
    assert_eq!(membership.role, MembershipRole::User);

    let user = User::find(&ctx.db, user_id).await.unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Unverified);

    ctx.cleanup().await.unwrap();
}

/// A second invitation for the same pair is rejected with 409
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_duplicate_invitation_conflict() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("invitee-{}@example.com", Uuid::new_v4());
    common::issue_invitation(&ctx, &email).await.unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        format!("/organisations/{}/invitations", ctx.organisation.id),
        Some(&ctx.jwt_token),
        Some(json!({
            "email": email,
            "name": "Invited",
            "last_name": "Person"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    ctx.cleanup().await.unwrap();
}

/// Redeeming an invitation activates the membership, verifies the user
/// and issues a session; a second redemption fails with 422
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_accept_invitation_round_trip() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("invitee-{}@example.com", Uuid::new_v4());
    let (user_id, code) = common::issue_invitation(&ctx, &email).await.unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        "/users/accept-invitation".to_string(),
        None,
        Some(json!({ "invitation_id": code })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["jwt"].is_string());

    let membership = Membership::find(&ctx.db, ctx.organisation.id, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Active);

    let user = User::find(&ctx.db, user_id).await.unwrap().unwrap();
    assert_eq!(user.status, UserStatus::Verified);

    // The issued session is bound to the joined organisation.
    let session = body["jwt"].as_str().unwrap();
    let (status, users) = call(
        &ctx,
        "GET",
        format!("/organisations/{}/users", ctx.organisation.id),
        Some(session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(users.as_array().unwrap().len() >= 2);

    // Second redemption of the same code must fail.
    let (status, body) = call(
        &ctx,
        "POST",
        "/users/accept-invitation".to_string(),
        None,
        Some(json!({ "invitation_id": code })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "already_accepted");

    ctx.cleanup().await.unwrap();
}

/// Unknown codes are rejected with 404
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_accept_unknown_code() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        "/users/accept-invitation".to_string(),
        None,
        Some(json!({ "invitation_id": "definitely-not-issued" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    ctx.cleanup().await.unwrap();
}

/// A missing or empty invitation code yields the structured
/// invalid-field error, not a bare extractor rejection
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_accept_without_code() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        "/users/accept-invitation".to_string(),
        None,
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, body) = call(
        &ctx,
        "POST",
        "/users/accept-invitation".to_string(),
        None,
        Some(json!({ "invitation_id": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    ctx.cleanup().await.unwrap();
}

/// Cancelling a pending invitation frees the pair for a new one
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_cancel_invitation() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("invitee-{}@example.com", Uuid::new_v4());
    let (user_id, _) = common::issue_invitation(&ctx, &email).await.unwrap();

    let (status, _) = call(
        &ctx,
        "DELETE",
        format!(
            "/organisations/{}/invitations/{}",
            ctx.organisation.id, user_id
        ),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(Membership::find(&ctx.db, ctx.organisation.id, user_id)
        .await
        .unwrap()
        .is_none());

    // The soft-deleted row no longer blocks a fresh invitation.
    common::issue_invitation(&ctx, &email).await.unwrap();

    ctx.cleanup().await.unwrap();
}

/// Pending invitations are listed separately from active members
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_list_invitations() {
    let ctx = TestContext::new().await.unwrap();

    let email = format!("invitee-{}@example.com", Uuid::new_v4());
    let (user_id, _) = common::issue_invitation(&ctx, &email).await.unwrap();

    let (status, body) = call(
        &ctx,
        "GET",
        format!("/organisations/{}/invitations", ctx.organisation.id),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|u| u["id"].as_str())
        .collect();
    assert!(listed.contains(&user_id.to_string().as_str()));
    assert!(!listed.contains(&ctx.admin.id.to_string().as_str()));

    ctx.cleanup().await.unwrap();
}

/// Demoting one of two admins succeeds; demoting the last one is
/// refused with 403
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_admin_floor() {
    let ctx = TestContext::new().await.unwrap();

    let second_admin = common::create_member(&ctx, MembershipRole::Admin)
        .await
        .unwrap();

    let (status, _) = call(
        &ctx,
        "PATCH",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, second_admin.id
        ),
        Some(&ctx.jwt_token),
        Some(json!({ "is_admin": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The test admin is now the only one left.
    let (status, body) = call(
        &ctx,
        "PATCH",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, ctx.admin.id
        ),
        Some(&ctx.jwt_token),
        Some(json!({ "is_admin": false })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    ctx.cleanup().await.unwrap();
}

/// Role changes require an active admin membership
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_role_change_requires_admin() {
    let ctx = TestContext::new().await.unwrap();

    let member = common::create_member(&ctx, MembershipRole::User)
        .await
        .unwrap();
    let member_token = ctx.token_for(member.id, ctx.organisation.id).unwrap();

    let (status, _) = call(
        &ctx,
        "PATCH",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, member.id
        ),
        Some(&member_token),
        Some(json!({ "is_admin": true })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    ctx.cleanup().await.unwrap();
}

/// An organisation admin cannot remove their own admin membership, but
/// a platform admin can remove anyone
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_remove_member_self_protection() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        "DELETE",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, ctx.admin.id
        ),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    // A platform admin may remove the organisation admin.
    let operator = common::create_member(&ctx, MembershipRole::User)
        .await
        .unwrap();
    common::make_global_admin(&ctx, operator.id).await.unwrap();
    let operator_token = ctx.token_for(operator.id, ctx.organisation.id).unwrap();

    let (status, _) = call(
        &ctx,
        "DELETE",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, ctx.admin.id
        ),
        Some(&operator_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert!(Membership::find(&ctx.db, ctx.organisation.id, ctx.admin.id)
        .await
        .unwrap()
        .is_none());

    ctx.cleanup().await.unwrap();
}

/// Direct member adds are reserved for platform admins
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_direct_add_requires_platform_admin() {
    let ctx = TestContext::new().await.unwrap();

    let outsider = common::create_member(&ctx, MembershipRole::User)
        .await
        .unwrap();
    // Remove the helper-created membership so the add has something to
    // do.
    let membership = Membership::find(&ctx.db, ctx.organisation.id, outsider.id)
        .await
        .unwrap()
        .unwrap();
    Membership::soft_delete(&ctx.db, membership.id).await.unwrap();

    // The organisation admin is refused.
    let (status, _) = call(
        &ctx,
        "POST",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, outsider.id
        ),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A platform admin succeeds, and the membership is created active.
    common::make_global_admin(&ctx, ctx.admin.id).await.unwrap();
    let (status, _) = call(
        &ctx,
        "POST",
        format!(
            "/organisations/{}/users/{}",
            ctx.organisation.id, outsider.id
        ),
        Some(&ctx.jwt_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let membership = Membership::find(&ctx.db, ctx.organisation.id, outsider.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Active);

    ctx.cleanup().await.unwrap();
}

/// A removed member's still-valid session no longer lists members
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_removed_member_cannot_list() {
    let ctx = TestContext::new().await.unwrap();

    let member = common::create_member(&ctx, MembershipRole::User)
        .await
        .unwrap();
    let member_token = ctx.token_for(member.id, ctx.organisation.id).unwrap();

    let (status, _) = call(
        &ctx,
        "GET",
        format!("/organisations/{}/users", ctx.organisation.id),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Removing the membership must cut off access even though the
    // session token stays valid for the rest of its lifetime.
    let membership = Membership::find(&ctx.db, ctx.organisation.id, member.id)
        .await
        .unwrap()
        .unwrap();
    Membership::soft_delete(&ctx.db, membership.id).await.unwrap();

    let (status, body) = call(
        &ctx,
        "GET",
        format!("/organisations/{}/users", ctx.organisation.id),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    ctx.cleanup().await.unwrap();
}

/// A session bound to another organisation cannot touch this one
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_wrong_organisation_forbidden() {
    let ctx = TestContext::new().await.unwrap();

    let foreign_token = ctx.token_for(ctx.admin.id, Uuid::new_v4()).unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        format!("/organisations/{}/invitations", ctx.organisation.id),
        Some(&foreign_token),
        Some(json!({
            "email": "someone@example.com",
            "name": "Some",
            "last_name": "One"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    ctx.cleanup().await.unwrap();
}

/// Requests without a valid session are rejected with 401
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_missing_session_unauthorized() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = call(
        &ctx,
        "GET",
        format!("/organisations/{}/users", ctx.organisation.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Invalid invitation payloads produce a 422 with field details
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_invitation_validation() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(
        &ctx,
        "POST",
        format!("/organisations/{}/invitations", ctx.organisation.id),
        Some(&ctx.jwt_token),
        Some(json!({
            "email": "not-an-email",
            "name": "Invited",
            "last_name": "Person"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "email");

    ctx.cleanup().await.unwrap();
}

/// The sweeper reclaims invitations older than the retention window
/// and leaves fresh ones alone
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_expired_invitations_swept() {
    let ctx = TestContext::new().await.unwrap();

    let stale_email = format!("stale-{}@example.com", Uuid::new_v4());
    let (stale_user, _) = common::issue_invitation(&ctx, &stale_email).await.unwrap();

    let fresh_email = format!("fresh-{}@example.com", Uuid::new_v4());
    let (fresh_user, _) = common::issue_invitation(&ctx, &fresh_email).await.unwrap();

    // Backdate the first invitation past the retention window.
    sqlx::query(
        "UPDATE memberships SET created_at = NOW() - INTERVAL '31 days' \
         WHERE organisation_id = $1 AND user_id = $2",
    )
    .bind(ctx.organisation.id)
    .bind(stale_user)
    .execute(&ctx.db)
    .await
    .unwrap();

    let sweeper = Sweeper::new(ctx.db.clone());
    sweeper.sweep_once().await;

    assert!(Membership::find(&ctx.db, ctx.organisation.id, stale_user)
        .await
        .unwrap()
        .is_none());
    assert!(Membership::find(&ctx.db, ctx.organisation.id, fresh_user)
        .await
        .unwrap()
        .is_some());

    ctx.cleanup().await.unwrap();
}

/// Health endpoint reports a healthy service
#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = call(&ctx, "GET", "/health".to_string(), None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}
