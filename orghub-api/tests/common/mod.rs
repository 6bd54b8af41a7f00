/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup and cleanup
/// - Test Redis connection
/// - Test organisation/user creation
/// - JWT session token generation
/// - Request helpers

use axum::body::Body;
use axum::http::Request;
use axum::Router;
use orghub_api::app::{build_router, AppState};
use orghub_api::config::Config;
use orghub_shared::auth::jwt::{create_session_token, Claims};
use orghub_shared::email::{EmailClient, EmailConfig, Mailer};
use orghub_shared::models::membership::{
    CreateMembership, Membership, MembershipRole, MembershipStatus,
};
use orghub_shared::models::organisation::{CreateOrganisation, Organisation};
use orghub_shared::models::user::{CreateUser, User};
use orghub_shared::redis::{InvitationCodes, RedisClient, RedisConfig};
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    pub organisation: Organisation,
    pub admin: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh organisation and admin
    pub async fn new() -> anyhow::Result<Self> {
        // Load test configuration
        let config = Config::from_env()?;

        // Connect to database
        let db = PgPool::connect(&config.database.url).await?;

        // Run migrations (path relative to Cargo.toml, not this file)
        sqlx::migrate!("../migrations").run(&db).await?;

        // Connect to Redis
        let redis = RedisClient::new(RedisConfig::from_env()?).await?;
        let codes = InvitationCodes::new(redis);

        // Email worker pointed at an unroutable provider; deliveries
        // fail inside the worker without affecting the tests.
        let mailer = Mailer::spawn(EmailClient::new(EmailConfig {
            api_url: "http://127.0.0.1:1/send".to_string(),
            api_key: "test".to_string(),
            sender: "no-reply@orghub.dev".to_string(),
        }));

        // Create test organisation
        let organisation = Organisation::create(
            &db,
            CreateOrganisation {
                name: format!("test-org-{}", Uuid::new_v4()),
                display_name: Some("Test Organisation".to_string()),
            },
        )
        .await?;

        // Create test admin with an active admin membership
        let admin = User::create(
            &db,
            CreateUser {
                email: format!("admin-{}@example.com", Uuid::new_v4()),
                name: Some("Test".to_string()),
                last_name: Some("Admin".to_string()),
                phone_country_code: None,
                phone_number: None,
            },
        )
        .await?;

        Membership::create(
            &db,
            CreateMembership {
                organisation_id: organisation.id,
                user_id: admin.id,
                role: MembershipRole::Admin,
                status: MembershipStatus::Active,
                is_home: true,
            },
        )
        .await?;

        // Generate session token bound to the test organisation
        let claims = Claims::new(admin.id, organisation.id);
        let jwt_token = create_session_token(&claims, &config.jwt.secret)?;

        // Build app
        let state = AppState::new(db.clone(), codes, mailer, config.clone());
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            organisation,
            admin,
            jwt_token,
        })
    }

    /// Returns the admin's authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Generates a session token for an arbitrary user/organisation pair
    pub fn token_for(&self, user_id: Uuid, organisation_id: Uuid) -> anyhow::Result<String> {
        let claims = Claims::new(user_id, organisation_id);
        Ok(create_session_token(&claims, &self.config.jwt.secret)?)
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        // Deleting the organisation cascades to its memberships.
        sqlx::query("DELETE FROM organisations WHERE id = $1")
            .bind(self.organisation.id)
            .execute(&self.db)
            .await?;
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(self.admin.id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Creates an active member of the test organisation
pub async fn create_member(
    ctx: &TestContext,
    role: MembershipRole,
) -> anyhow::Result<User> {
    let user = User::create(
        &ctx.db,
        CreateUser {
            email: format!("member-{}@example.com", Uuid::new_v4()),
            name: Some("Test".to_string()),
            last_name: Some("Member".to_string()),
            phone_country_code: None,
            phone_number: None,
        },
    )
    .await?;

    Membership::create(
        &ctx.db,
        CreateMembership {
            organisation_id: ctx.organisation.id,
            user_id: user.id,
            role,
            status: MembershipStatus::Active,
            is_home: false,
        },
    )
    .await?;

    Ok(user)
}

/// Promotes a user to platform admin
pub async fn make_global_admin(ctx: &TestContext, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET role = 'admin' WHERE id = $1")
        .bind(user_id)
        .execute(&ctx.db)
        .await?;
    Ok(())
}

/// Issues an invitation via the API and returns (invited user ID, code)
///
/// The raw code is available because test configuration never runs in
/// the production environment.
pub async fn issue_invitation(ctx: &TestContext, email: &str) -> anyhow::Result<(Uuid, String)> {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/organisations/{}/invitations", ctx.organisation.id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::json!({
                "email": email,
                "name": "Invited",
                "last_name": "Person"
            })
            .to_string(),
        ))?;

    let response = ctx.app.clone().call(request).await?;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;

    if status != axum::http::StatusCode::OK {
        anyhow::bail!(
            "Invitation issue failed with {}: {}",
            status,
            String::from_utf8_lossy(&body)
        );
    }

    let json: serde_json::Value = serde_json::from_slice(&body)?;
    let user_id: Uuid = json["uuid"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing uuid in response"))?
        .parse()?;
    let code = json["code"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing code in response"))?
        .to_string();

    Ok((user_id, code))
}
